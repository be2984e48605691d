pub mod account;
pub mod catalog;
pub mod page;
pub mod reaction;
pub mod task;

pub use account::{
    Account, AccountKind, AccountProfile, Developer, DeveloperProfile, DeveloperProfileView,
    DeveloperUpdate, Employer, EmployerProfile, EmployerUpdate, NewAccount,
};
pub use catalog::{AchievementTemplate, DeveloperAchievement, Skill, SkillAssignment};
pub use page::{Page, PageQuery};
pub use reaction::{Reaction, ReactionInput};
pub use task::{Assignment, AssignmentInput, Task, TaskFilter, TaskInput, TaskUpdate};
