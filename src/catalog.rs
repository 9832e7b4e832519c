// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory course catalog with category, difficulty, and text filters.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::Course;
use crate::services::ApiClient;

/// Filter value meaning "no filter".
pub const ALL: &str = "All";

/// Catalog filter as chosen in the course browser.
///
/// Category and difficulty match exactly unless set to `"All"` (or empty).
/// `search_text` is a case-insensitive substring match on title or
/// description. All active filters must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFilter {
    pub category: String,
    pub difficulty: String,
    pub search_text: String,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            category: ALL.to_string(),
            difficulty: ALL.to_string(),
            search_text: String::new(),
        }
    }
}

fn is_active(value: &str) -> bool {
    !value.is_empty() && value != ALL
}

impl CourseFilter {
    pub fn is_empty(&self) -> bool {
        !is_active(&self.category) && !is_active(&self.difficulty) && self.search_text.is_empty()
    }

    /// Check a single course against the filter.
    pub fn matches(&self, course: &Course) -> bool {
        if is_active(&self.category) && course.category != self.category {
            return false;
        }
        if is_active(&self.difficulty) && course.difficulty != self.difficulty {
            return false;
        }
        if self.search_text.is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        course.title.to_lowercase().contains(&needle)
            || course.description.to_lowercase().contains(&needle)
    }

    /// Query parameters for `GET /courses`; inactive filters are omitted.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if is_active(&self.category) {
            pairs.push(("category", self.category.clone()));
        }
        if is_active(&self.difficulty) {
            pairs.push(("difficulty", self.difficulty.clone()));
        }
        if !self.search_text.is_empty() {
            pairs.push(("search", self.search_text.clone()));
        }
        pairs
    }
}

/// Apply `filter` to `courses`, keeping input order.
pub fn filter<'a>(courses: &'a [Course], filter: &CourseFilter) -> Vec<&'a Course> {
    courses.iter().filter(|c| filter.matches(c)).collect()
}

/// Courses fetched for the current session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    /// Fetch the full course list, replacing what was held before.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<()> {
        self.courses = api.get_courses(&CourseFilter::default()).await?;
        tracing::debug!(count = self.courses.len(), "Catalog refreshed");
        Ok(())
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn filter(&self, course_filter: &CourseFilter) -> Vec<&Course> {
        filter(&self.courses, course_filter)
    }

    pub fn find(&self, course_id: u64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn featured(&self) -> Vec<&Course> {
        self.courses.iter().filter(|c| c.is_featured).collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.courses
            .iter()
            .map(|c| c.category.clone())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: u64, title: &str, description: &str, category: &str, difficulty: &str) -> Course {
        Course {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            difficulty: difficulty.to_string(),
            instructor: None,
            thumbnail_url: None,
            is_featured: id % 2 == 0,
            is_active: true,
            enrolled_students: 0,
            stages: Vec::new(),
        }
    }

    fn courses() -> Vec<Course> {
        vec![
            course(1, "Web Development Mastery", "HTML, CSS and JavaScript", "Development", "Beginner"),
            course(2, "Trading & Finance", "Markets and risk", "Finance", "Intermediate"),
            course(3, "Cloud Architecture", "Designing for the web at scale", "Technology", "Advanced"),
            course(4, "Python Basics", "Your first programs", "Development", "Beginner"),
        ]
    }

    fn ids(courses: &[&Course]) -> Vec<u64> {
        courses.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_all_filters_return_everything_in_order() {
        let courses = courses();
        let f = CourseFilter::default();
        assert!(f.is_empty());
        assert_eq!(ids(&filter(&courses, &f)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_search_is_case_insensitive_on_title_or_description() {
        let courses = courses();
        let f = CourseFilter {
            search_text: "web".to_string(),
            ..Default::default()
        };
        let found = filter(&courses, &f);
        assert_eq!(ids(&found), vec![1, 3]);
        assert!(found.iter().all(|c| c.title != "Trading & Finance"));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let courses = courses();
        let f = CourseFilter {
            category: "Development".to_string(),
            difficulty: "Beginner".to_string(),
            search_text: "PYTHON".to_string(),
        };
        assert_eq!(ids(&filter(&courses, &f)), vec![4]);

        let f = CourseFilter {
            category: "Finance".to_string(),
            difficulty: "Beginner".to_string(),
            search_text: String::new(),
        };
        assert!(filter(&courses, &f).is_empty());
    }

    #[test]
    fn test_category_is_exact_match() {
        let courses = courses();
        let f = CourseFilter {
            category: "development".to_string(),
            ..Default::default()
        };
        assert!(filter(&courses, &f).is_empty());
    }

    #[test]
    fn test_query_omits_all() {
        let f = CourseFilter {
            category: "Finance".to_string(),
            difficulty: ALL.to_string(),
            search_text: "risk".to_string(),
        };
        assert_eq!(
            f.to_query(),
            vec![("category", "Finance".to_string()), ("search", "risk".to_string())]
        );
        assert!(CourseFilter::default().to_query().is_empty());
    }

    #[test]
    fn test_catalog_helpers() {
        let catalog = Catalog::new(courses());
        assert_eq!(ids(&catalog.featured()), vec![2, 4]);
        assert_eq!(
            catalog.categories(),
            vec!["Development", "Finance", "Technology"]
        );
        assert_eq!(catalog.find(3).map(|c| c.title.as_str()), Some("Cloud Architecture"));
        assert!(catalog.find(9).is_none());
    }
}
