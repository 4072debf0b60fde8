pub mod envelope;
pub mod recruit;
pub mod team;
pub mod tier;
pub mod token;
pub mod user;

pub use envelope::ApiResponse;
pub use recruit::{RecruitDecision, RecruitList, RecruitRequest, RecruitStatus, SendRecruitRequest};
pub use team::{Team, TeamCreateRequest, TeamList};
pub use tier::{Rank, Standing, Tier};
pub use token::StoredToken;
pub use user::{
    GradeInfo, LoginRequest, LoginResponse, Profile, RiotAccountRequest, UserList, UserQuery,
    UserRole,
};
