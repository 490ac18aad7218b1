//! Content metadata provider
//!
//! Lesson definitions (titles, XP rewards, challenge test cases) come from
//! an external content source in production. The engine only depends on the
//! [`ContentProvider`] trait; [`StaticCatalog`] ships a seeded Solana
//! curriculum so the service runs standalone.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Video,
    Article,
    Challenge,
}

/// One test case of a challenge lesson. Grading is delegated to the judge;
/// `expected` is a human-readable description, not an assertion the engine
/// evaluates itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub description: String,
    pub visible: bool,
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMeta {
    pub id: String,
    pub course_slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub order: u32,
    /// Estimated duration in minutes.
    pub duration: u32,
    pub xp_reward: u64,
    /// Ordered test cases; empty for non-challenge lessons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<TestCase>,
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Lesson definition, or None when the course or lesson is unknown.
    async fn lesson(&self, course_slug: &str, lesson_id: &str) -> Option<LessonMeta>;

    /// All lessons of a course in curriculum order, or None for an unknown
    /// course. An empty course returns an empty vec, not None.
    async fn course_lessons(&self, course_slug: &str) -> Option<Vec<LessonMeta>>;
}

/// In-memory catalog keyed by course slug.
pub struct StaticCatalog {
    courses: HashMap<String, Vec<LessonMeta>>,
}

impl StaticCatalog {
    pub fn new(courses: HashMap<String, Vec<LessonMeta>>) -> Self {
        Self { courses }
    }

    /// The seeded default curriculum.
    pub fn solana_curriculum() -> Self {
        let mut courses = HashMap::new();
        courses.insert(
            "solana-fundamentals".to_string(),
            vec![
                article("solana-fundamentals", "intro-to-solana", "Introduction to Solana", 1, 15, 50),
                article("solana-fundamentals", "understanding-accounts", "Understanding Solana Accounts", 2, 20, 75),
                video("solana-fundamentals", "transactions-deep-dive", "Transactions Deep Dive", 3, 18, 75),
                LessonMeta {
                    id: "first-program".to_string(),
                    course_slug: "solana-fundamentals".to_string(),
                    title: "Your First Solana Program".to_string(),
                    lesson_type: LessonType::Challenge,
                    order: 4,
                    duration: 30,
                    xp_reward: 150,
                    test_cases: vec![
                        case("fp-1", "program compiles", "The program builds without errors", true, "exit code 0"),
                        case("fp-2", "process_instruction defined", "Entrypoint handler is exported", true, "symbol present"),
                        case("fp-3", "greeting logged", "Program logs the greeting message", false, "log contains 'Hello'"),
                    ],
                },
            ],
        );
        courses.insert(
            "anchor-basics".to_string(),
            vec![
                article("anchor-basics", "anchor-setup", "Setting Up Anchor", 1, 10, 50),
                article("anchor-basics", "anchor-accounts", "Accounts in Anchor", 2, 20, 100),
                LessonMeta {
                    id: "counter-program".to_string(),
                    course_slug: "anchor-basics".to_string(),
                    title: "Build a Counter Program".to_string(),
                    lesson_type: LessonType::Challenge,
                    order: 3,
                    duration: 40,
                    xp_reward: 200,
                    test_cases: vec![
                        case("cp-1", "initialize works", "Counter account is created at zero", true, "count == 0"),
                        case("cp-2", "increment works", "Increment bumps the counter by one", true, "count == 1"),
                    ],
                },
            ],
        );
        Self::new(courses)
    }
}

#[async_trait]
impl ContentProvider for StaticCatalog {
    async fn lesson(&self, course_slug: &str, lesson_id: &str) -> Option<LessonMeta> {
        self.courses
            .get(course_slug)?
            .iter()
            .find(|lesson| lesson.id == lesson_id)
            .cloned()
    }

    async fn course_lessons(&self, course_slug: &str) -> Option<Vec<LessonMeta>> {
        self.courses.get(course_slug).cloned()
    }
}

fn article(course: &str, id: &str, title: &str, order: u32, duration: u32, xp: u64) -> LessonMeta {
    LessonMeta {
        id: id.to_string(),
        course_slug: course.to_string(),
        title: title.to_string(),
        lesson_type: LessonType::Article,
        order,
        duration,
        xp_reward: xp,
        test_cases: Vec::new(),
    }
}

fn video(course: &str, id: &str, title: &str, order: u32, duration: u32, xp: u64) -> LessonMeta {
    LessonMeta {
        lesson_type: LessonType::Video,
        ..article(course, id, title, order, duration, xp)
    }
}

fn case(id: &str, name: &str, description: &str, visible: bool, expected: &str) -> TestCase {
    TestCase {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        visible,
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_lessons_resolve() {
        let catalog = StaticCatalog::solana_curriculum();
        let lesson = catalog.lesson("solana-fundamentals", "intro-to-solana").await;
        assert!(lesson.is_some());
        assert_eq!(lesson.unwrap().xp_reward, 50);
    }

    #[tokio::test]
    async fn test_unknown_course_is_none() {
        let catalog = StaticCatalog::solana_curriculum();
        assert!(catalog.lesson("no-such-course", "intro-to-solana").await.is_none());
        assert!(catalog.course_lessons("no-such-course").await.is_none());
    }

    #[tokio::test]
    async fn test_lessons_in_curriculum_order() {
        let catalog = StaticCatalog::solana_curriculum();
        let lessons = catalog.course_lessons("solana-fundamentals").await.unwrap();
        let orders: Vec<u32> = lessons.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }
}
