//! Query-string parsing for list endpoints. Problems are collected per
//! parameter and reported together.

use std::collections::HashMap;
use airport_core::filter::{parse_date, parse_id_list, parse_non_negative, PageRequest};
use airport_core::ValidationErrors;
use airport_store::app_config::PaginationConfig;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppError;

pub struct ListQuery {
    params: HashMap<String, String>,
    errors: ValidationErrors,
}

impl ListQuery {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params, errors: ValidationErrors::new() }
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// A free-text filter; blank values count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key).map(str::to_string)
    }

    pub fn ids(&mut self, key: &str) -> Vec<Uuid> {
        let Some(raw) = self.text(key) else { return Vec::new() };
        match parse_id_list(key, &raw) {
            Ok(ids) => ids,
            Err(errors) => {
                self.errors.merge(errors);
                Vec::new()
            }
        }
    }

    pub fn date(&mut self, key: &str) -> Option<NaiveDate> {
        let raw = self.text(key)?;
        match parse_date(key, &raw) {
            Ok(date) => Some(date),
            Err(errors) => {
                self.errors.merge(errors);
                None
            }
        }
    }

    pub fn non_negative(&mut self, key: &str) -> Option<i64> {
        let raw = self.text(key)?;
        match parse_non_negative(key, &raw) {
            Ok(value) => Some(value),
            Err(errors) => {
                self.errors.merge(errors);
                None
            }
        }
    }

    /// Reads `page` / `page_size` and fails with everything collected so far.
    pub fn finish(mut self, pagination: &PaginationConfig) -> Result<PageRequest, AppError> {
        let page = match self.text("page") {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) => Some(page),
                Err(_) => {
                    self.errors.add("page", "Invalid page.");
                    None
                }
            },
        };
        let page_size = self.non_negative("page_size").map(|size| size as u64);

        let request = PageRequest::new(
            page,
            page_size,
            pagination.default_page_size,
            pagination.max_page_size,
        );
        match request {
            Ok(request) if self.errors.is_empty() => Ok(request),
            Ok(_) => Err(self.errors.into()),
            Err(page_errors) => {
                self.errors.merge(page_errors);
                Err(self.errors.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn pagination() -> PaginationConfig {
        PaginationConfig { default_page_size: 20, max_page_size: 100 }
    }

    #[test]
    fn test_defaults_to_first_page() {
        let page = query(&[]).finish(&pagination()).unwrap();
        assert_eq!(page, PageRequest { offset: 0, limit: 20 });
    }

    #[test]
    fn test_page_size_is_clamped() {
        let page = query(&[("page", "3"), ("page_size", "500")]).finish(&pagination()).unwrap();
        assert_eq!(page, PageRequest { offset: 200, limit: 100 });
    }

    #[test]
    fn test_bad_values_are_reported_together() {
        let mut q = query(&[("departure_date", "tomorrow"), ("crew", "nope"), ("page", "0")]);
        assert!(q.date("departure_date").is_none());
        assert!(q.ids("crew").is_empty());

        match q.finish(&pagination()) {
            Err(AppError::ValidationError(errors)) => {
                assert!(errors.has("departure_date"));
                assert!(errors.has("crew"));
                assert_eq!(errors.messages("page"), ["Invalid page."]);
            }
            _ => panic!("expected validation errors"),
        }
    }

    #[test]
    fn test_blank_text_is_absent() {
        let q = query(&[("city", "  "), ("code", "aa")]);
        assert_eq!(q.text("city"), None);
        assert_eq!(q.text("code").as_deref(), Some("aa"));
    }
}
