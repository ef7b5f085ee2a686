//! Seed data shared by repository and route tests

use sqlx::SqlitePool;

use crate::models::{Role, Subject};

pub(crate) async fn user(pool: &SqlitePool, name: &str, email: &str, role: Role) -> i64 {
    sqlx::query_scalar("INSERT INTO users (name, email, password, role) VALUES (?, ?, 'x', ?) RETURNING id")
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub(crate) async fn assignment(
    pool: &SqlitePool,
    student_id: i64,
    title: &str,
    content: &str,
    subject: Subject,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO assignments (title, content, subject, student_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(title)
    .bind(content)
    .bind(subject)
    .bind(student_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub(crate) async fn grade(
    pool: &SqlitePool,
    assignment_id: i64,
    teacher_id: i64,
    grade: f64,
    feedback: &str,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO grades (assignment_id, teacher_id, grade, feedback) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(assignment_id)
    .bind(teacher_id)
    .bind(grade)
    .bind(feedback)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Ids created by [`classroom`]
pub(crate) struct Classroom {
    pub ada: i64,
    pub bob: i64,
    pub teacher: i64,
    pub algebra: i64,
    pub essay: i64,
    pub geometry: i64,
}

/// Two students, one teacher, three assignments, one of them graded
pub(crate) async fn classroom(pool: &SqlitePool) -> Classroom {
    let ada = user(pool, "Ada Lovelace", "ada@school.test", Role::Student).await;
    let bob = user(pool, "Bob Marley", "bob@school.test", Role::Student).await;
    let teacher = user(pool, "Grace Hopper", "grace@school.test", Role::Teacher).await;

    let algebra = assignment(pool, ada, "Algebra basics", "x + 1 = 2", Subject::Math).await;
    let essay = assignment(pool, ada, "My summer", "An ESSAY about the sea", Subject::English).await;
    let geometry = assignment(pool, bob, "Triangles", "Angles sum to 180", Subject::Math).await;
    grade(pool, algebra, teacher, 9.5, "Solid algebra work").await;

    Classroom {
        ada,
        bob,
        teacher,
        algebra,
        essay,
        geometry,
    }
}
