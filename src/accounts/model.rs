use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

/// Role tag of a user's profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    #[default]
    ProjectManager,
    UiUxDesigner,
    GraphicDesigner,
    FrontendDeveloper,
    BackendDeveloper,
    QualityAnalyst,
}

impl ProfileType {
    pub const ALL: [ProfileType; 6] = [
        ProfileType::ProjectManager,
        ProfileType::UiUxDesigner,
        ProfileType::GraphicDesigner,
        ProfileType::FrontendDeveloper,
        ProfileType::BackendDeveloper,
        ProfileType::QualityAnalyst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::ProjectManager => "project_manager",
            ProfileType::UiUxDesigner => "ui_ux_designer",
            ProfileType::GraphicDesigner => "graphic_designer",
            ProfileType::FrontendDeveloper => "frontend_developer",
            ProfileType::BackendDeveloper => "backend_developer",
            ProfileType::QualityAnalyst => "quality_analyst",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProfileType::ProjectManager => "Project Manager",
            ProfileType::UiUxDesigner => "Ui Ux Designer",
            ProfileType::GraphicDesigner => "Graphic Designer",
            ProfileType::FrontendDeveloper => "Frontend Developer",
            ProfileType::BackendDeveloper => "Backend Developer",
            ProfileType::QualityAnalyst => "Quality Analyst",
        }
    }
}

impl FromStr for ProfileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown profile type: {}", s))
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pronouns stored in the `gender` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_pronoun")]
pub enum Pronoun {
    #[default]
    #[sqlx(rename = "he/him")]
    #[serde(rename = "he/him")]
    HeHim,
    #[sqlx(rename = "she/her")]
    #[serde(rename = "she/her")]
    SheHer,
    #[sqlx(rename = "other")]
    #[serde(rename = "other")]
    Other,
}

impl Pronoun {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pronoun::HeHim => "he/him",
            Pronoun::SheHer => "she/her",
            Pronoun::Other => "other",
        }
    }
}

impl FromStr for Pronoun {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "he/him" => Ok(Pronoun::HeHim),
            "she/her" => Ok(Pronoun::SheHer),
            "other" => Ok(Pronoun::Other),
            _ => Err(format!("unknown pronoun: {}", s)),
        }
    }
}

impl fmt::Display for Pronoun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the `accounts_user` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // argon2 PHC string or unusable marker
    #[serde(skip_serializing)]
    pub encrypted_password: Option<String>,
    #[validate(length(max = 128))]
    pub name: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,
    pub profile_type: ProfileType,
    #[validate(range(min = 0, max = 99))]
    pub age: Option<i16>,
    pub birth_date: Option<Date>,
    #[validate(length(max = 999))]
    pub qualification: Option<String>,
    #[validate(length(max = 999))]
    pub employee_id: Option<String>,
    pub id_proof: Option<String>, // storage key
    pub is_deleted: bool,
    pub gender: Option<Pronoun>,
    pub image: Option<String>,           // storage key
    pub thumbnail_image: Option<String>, // storage key, derived from `image`
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<OffsetDateTime>,
    pub date_joined: OffsetDateTime,
    pub date_updated: Option<OffsetDateTime>,
    /// True until the first successful save.
    #[sqlx(skip)]
    #[serde(skip)]
    pub(crate) adding: bool,
}

impl User {
    /// Build an unsaved user with default profile values.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password: String::new(),
            encrypted_password: None,
            name: None,
            first_name: String::new(),
            last_name: String::new(),
            profile_type: ProfileType::default(),
            age: None,
            birth_date: None,
            qualification: None,
            employee_id: None,
            id_proof: None,
            is_deleted: false,
            gender: Some(Pronoun::default()),
            image: None,
            thumbnail_image: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            date_joined: OffsetDateTime::now_utc(),
            date_updated: None,
            adding: true,
        }
    }

    pub fn is_adding(&self) -> bool {
        self.adding
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Optional fields accepted by user creation. Unset fields keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraFields {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_type: Option<ProfileType>,
    pub age: Option<i16>,
    pub birth_date: Option<Date>,
    pub qualification: Option<String>,
    pub employee_id: Option<String>,
    pub gender: Option<Pronoun>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl ExtraFields {
    pub(crate) fn apply(self, user: &mut User) {
        if let Some(v) = self.name {
            user.name = Some(v);
        }
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.profile_type {
            user.profile_type = v;
        }
        user.age = self.age.or(user.age);
        user.birth_date = self.birth_date.or(user.birth_date);
        if let Some(v) = self.qualification {
            user.qualification = Some(v);
        }
        if let Some(v) = self.employee_id {
            user.employee_id = Some(v);
        }
        if let Some(v) = self.gender {
            user.gender = Some(v);
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
        if let Some(v) = self.is_staff {
            user.is_staff = v;
        }
        if let Some(v) = self.is_superuser {
            user.is_superuser = v;
        }
    }
}

/// Partial profile change applied to a loaded user before `save`.
///
/// `Some(None)` clears a nullable field, `None` leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_type: Option<ProfileType>,
    pub age: Option<Option<i16>>,
    pub birth_date: Option<Option<Date>>,
    pub qualification: Option<Option<String>>,
    pub employee_id: Option<Option<String>>,
    pub gender: Option<Option<Pronoun>>,
    pub is_active: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.name {
            user.name = v;
        }
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.profile_type {
            user.profile_type = v;
        }
        if let Some(v) = self.age {
            user.age = v;
        }
        if let Some(v) = self.birth_date {
            user.birth_date = v;
        }
        if let Some(v) = self.qualification {
            user.qualification = v;
        }
        if let Some(v) = self.employee_id {
            user.employee_id = v;
        }
        if let Some(v) = self.gender {
            user.gender = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
    }
}
