use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::db::{AccountLookup, Store, StoreError};
use crate::models::{DeveloperAchievement, Skill};

/// The two disjoint kinds of account, each with its own table and auth context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Developer,
    Employer,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Developer => "developer",
            AccountKind::Employer => "employer",
        }
    }

    /// URL prefix of the API group serving this kind.
    pub fn scope(&self) -> &'static str {
        match self {
            AccountKind::Developer => "/developer",
            AccountKind::Employer => "/employer",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account of either kind. Fields shared by both kinds live here; the
/// kind-specific part is `profile`, flattened into the JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account<P> {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(flatten)]
    pub profile: P,
}

/// Profile fields of a developer account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeveloperProfile {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Profile fields of an employer account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployerProfile {
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
}

pub type Developer = Account<DeveloperProfile>;
pub type Employer = Account<EmployerProfile>;

/// A not-yet-persisted account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount<P> {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: P,
}

/// Ties a profile type to its account kind and to the store operations that
/// read and create accounts of that kind, so registration, login and
/// authentication are written once for both kinds.
#[async_trait]
pub trait AccountProfile:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    const KIND: AccountKind;

    async fn find(
        store: &dyn Store,
        key: AccountLookup<'_>,
    ) -> Result<Option<Account<Self>>, StoreError>;

    async fn create(
        store: &dyn Store,
        account: NewAccount<Self>,
    ) -> Result<Account<Self>, StoreError>;
}

#[async_trait]
impl AccountProfile for DeveloperProfile {
    const KIND: AccountKind = AccountKind::Developer;

    async fn find(
        store: &dyn Store,
        key: AccountLookup<'_>,
    ) -> Result<Option<Developer>, StoreError> {
        store.find_developer(key).await
    }

    async fn create(
        store: &dyn Store,
        account: NewAccount<Self>,
    ) -> Result<Developer, StoreError> {
        store.create_developer(account).await
    }
}

#[async_trait]
impl AccountProfile for EmployerProfile {
    const KIND: AccountKind = AccountKind::Employer;

    async fn find(
        store: &dyn Store,
        key: AccountLookup<'_>,
    ) -> Result<Option<Employer>, StoreError> {
        store.find_employer(key).await
    }

    async fn create(store: &dyn Store, account: NewAccount<Self>) -> Result<Employer, StoreError> {
        store.create_employer(account).await
    }
}

/// Partial update of a developer account. Only fields that are `Some` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeveloperUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl DeveloperUpdate {
    pub fn apply(&self, developer: &mut Developer) {
        let profile = &mut developer.profile;
        if let Some(email) = &self.email {
            developer.email = email.clone();
        }
        if let Some(first_name) = &self.first_name {
            profile.first_name = Some(first_name.clone());
        }
        if let Some(middle_name) = &self.middle_name {
            profile.middle_name = Some(middle_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            profile.last_name = Some(last_name.clone());
        }
        if let Some(birth_date) = self.birth_date {
            profile.birth_date = Some(birth_date);
        }
        if let Some(city) = &self.city {
            profile.city = Some(city.clone());
        }
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.clone());
        }
    }
}

/// Partial update of an employer account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EmployerUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
}

impl EmployerUpdate {
    pub fn apply(&self, employer: &mut Employer) {
        if let Some(email) = &self.email {
            employer.email = email.clone();
        }
        if let Some(company_name) = &self.company_name {
            employer.profile.company_name = Some(company_name.clone());
        }
    }
}

/// Developer profile as returned by `GET /developer/profile/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperProfileView {
    #[serde(flatten)]
    pub account: Developer,
    pub skills: Vec<Skill>,
    pub achievements: Vec<DeveloperAchievement>,
}
