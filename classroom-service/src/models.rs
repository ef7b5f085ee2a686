//! Domain entities and their output projections
//!
//! Joined projections are decoded from flat rows whose columns carry a
//! relation prefix (`student_name`, `teacher_email`, ...). The password hash
//! lives only in [`UserCredentials`] and is never serialized.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Role {
    /// Submits assignments
    Student,
    /// Grades assignments
    Teacher,
}

impl Role {
    /// Lowercase name as stored and sent in tokens
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

/// Subject an assignment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Subject {
    English,
    Math,
}

impl Subject {
    /// Name as stored and displayed
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Math => "Math",
        }
    }
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    fn from_prefixed(row: &SqliteRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get(format!("{prefix}id").as_str())?,
            name: row.try_get(format!("{prefix}name").as_str())?,
            email: row.try_get(format!("{prefix}email").as_str())?,
            role: row.try_get(format!("{prefix}role").as_str())?,
        })
    }
}

/// Stored login material for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub role: Role,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// Grade overlay attached to an assignment, if it has been graded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentGrade {
    pub id: i64,
    pub grade: f64,
    pub feedback: String,
    pub teacher: User,
}

/// Assignment with its student and optional grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub subject: Subject,
    pub student: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<AssignmentGrade>,
}

impl<'r> FromRow<'r, SqliteRow> for Assignment {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let grade_id: Option<i64> = row.try_get("grade_id")?;
        let grade = match grade_id {
            Some(id) => Some(AssignmentGrade {
                id,
                grade: row.try_get("grade_grade")?,
                feedback: row.try_get("grade_feedback")?,
                teacher: User::from_prefixed(row, "teacher_")?,
            }),
            None => None,
        };

        Ok(Self {
            id: row.try_get("assignment_id")?,
            title: row.try_get("assignment_title")?,
            content: row.try_get("assignment_content")?,
            subject: row.try_get("assignment_subject")?,
            student: User::from_prefixed(row, "student_")?,
            grade,
        })
    }
}

/// Assignment as seen from its grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAssignment {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub subject: Subject,
    pub student: User,
}

/// Grade with its assignment and grading teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub grade: f64,
    pub feedback: String,
    pub assignment: GradedAssignment,
    pub teacher: User,
}

impl<'r> FromRow<'r, SqliteRow> for Grade {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("grade_id")?,
            grade: row.try_get("grade_grade")?,
            feedback: row.try_get("grade_feedback")?,
            assignment: GradedAssignment {
                id: row.try_get("assignment_id")?,
                title: row.try_get("assignment_title")?,
                content: row.try_get("assignment_content")?,
                subject: row.try_get("assignment_subject")?,
                student: User::from_prefixed(row, "student_")?,
            },
            teacher: User::from_prefixed(row, "teacher_")?,
        })
    }
}
