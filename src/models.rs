use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of subjects a course-selection map is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Physics,
    Chemistry,
    Math,
    Biology,
    ComputerScience,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Physics,
        Subject::Chemistry,
        Subject::Math,
        Subject::Biology,
        Subject::ComputerScience,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Math => "math",
            Subject::Biology => "biology",
            Subject::ComputerScience => "computerScience",
        }
    }

    pub fn from_key(key: &str) -> Option<Subject> {
        Subject::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// One value per subject. Serialized with the camelCase subject keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMap<T> {
    pub physics: T,
    pub chemistry: T,
    pub math: T,
    pub biology: T,
    pub computer_science: T,
}

impl<T> SubjectMap<T> {
    pub fn get_mut(&mut self, subject: Subject) -> &mut T {
        match subject {
            Subject::Physics => &mut self.physics,
            Subject::Chemistry => &mut self.chemistry,
            Subject::Math => &mut self.math,
            Subject::Biology => &mut self.biology,
            Subject::ComputerScience => &mut self.computer_science,
        }
    }
}

/// Student course entry. `total` is always `fee * classes` for selected
/// entries and zero otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub selected: bool,
    pub fee: i64,
    pub classes: i64,
    pub total: i64,
}

/// Teacher subject entry. Teachers charge per subject, with no class count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectFee {
    pub selected: bool,
    pub fee: i64,
}

pub type Courses = SubjectMap<CourseEntry>;
pub type Subjects = SubjectMap<SubjectFee>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseMode {
    #[default]
    Online,
    Offline,
}

impl CourseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseMode::Online => "online",
            CourseMode::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(CourseMode::Online),
            "offline" => Some(CourseMode::Offline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherType {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
}

impl TeacherType {
    pub fn as_str(self) -> &'static str {
        match self {
            TeacherType::FullTime => "full-time",
            TeacherType::PartTime => "part-time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full-time" => Some(TeacherType::FullTime),
            "part-time" => Some(TeacherType::PartTime),
            _ => None,
        }
    }
}

/// Role carried on records and in auth tokens. Students may only be
/// `student`/`admin`, teachers only `teacher`/`admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub contact_no: String,
    pub address: String,
    pub class_name: String,
    pub courses: Courses,
    pub course_mode: CourseMode,
    pub role: Role,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_amount: i64,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub contact_no: String,
    pub address: String,
    pub teacher_type: TeacherType,
    pub subjects: Subjects,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
