use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A post joined with its author's email.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

impl PostRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be blank".into()));
        }
        if self.title.chars().count() > 255 {
            return Err(AppError::Validation(
                "title must be at most 255 characters".into(),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::Validation("content must not be blank".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_email: String,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        PostDto {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author_email: post.author_email,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "p.id",
            SortField::Title => "p.title",
            SortField::CreatedAt => "p.created_at",
            SortField::UpdatedAt => "p.updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Raw `?page=&size=&sort=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

/// Normalized paging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable {
    pub page: i64,
    pub size: i64,
    pub sort: SortField,
    pub direction: Direction,
}

impl Default for Pageable {
    fn default() -> Self {
        Pageable {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: SortField::Id,
            direction: Direction::Asc,
        }
    }
}

impl Pageable {
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

impl TryFrom<PageQuery> for Pageable {
    type Error = AppError;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(0).max(0);
        let size = match query.size {
            Some(size) if size < 1 => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
            None => DEFAULT_PAGE_SIZE,
        };

        let (sort, direction) = match query.sort.as_deref().map(str::trim) {
            None | Some("") => (SortField::Id, Direction::Asc),
            Some(raw) => parse_sort(raw)?,
        };

        Ok(Pageable {
            page,
            size,
            sort,
            direction,
        })
    }
}

fn parse_sort(raw: &str) -> Result<(SortField, Direction), AppError> {
    let (field, direction) = match raw.split_once(',') {
        Some((field, dir)) => (field.trim(), dir.trim()),
        None => (raw, "asc"),
    };

    let field = match field {
        "id" => SortField::Id,
        "title" => SortField::Title,
        "createdAt" => SortField::CreatedAt,
        "updatedAt" => SortField::UpdatedAt,
        other => {
            return Err(AppError::Validation(format!(
                "cannot sort posts by '{other}'"
            )))
        }
    };

    let direction = if direction.eq_ignore_ascii_case("desc") {
        Direction::Desc
    } else if direction.eq_ignore_ascii_case("asc") {
        Direction::Asc
    } else {
        return Err(AppError::Validation(format!(
            "invalid sort direction '{direction}'"
        )));
    };

    Ok((field, direction))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + pageable.size - 1) / pageable.size
        };
        Page {
            content,
            number: pageable.page,
            size: pageable.size,
            total_elements,
            total_pages,
            first: pageable.page == 0,
            last: pageable.page.saturating_add(1) >= total_pages,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, size: Option<i64>, sort: Option<&str>) -> PageQuery {
        PageQuery {
            page,
            size,
            sort: sort.map(String::from),
        }
    }

    #[test]
    fn empty_query_uses_defaults() {
        let pageable = Pageable::try_from(PageQuery::default()).unwrap();
        assert_eq!(pageable, Pageable::default());
        assert_eq!(pageable.offset(), 0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let pageable = Pageable::try_from(query(Some(-3), Some(0), None)).unwrap();
        assert_eq!(pageable.page, 0);
        assert_eq!(pageable.size, DEFAULT_PAGE_SIZE);

        let pageable = Pageable::try_from(query(Some(2), Some(5000), None)).unwrap();
        assert_eq!(pageable.size, MAX_PAGE_SIZE);
        assert_eq!(pageable.offset(), 200);
    }

    #[test]
    fn parses_sort_field_and_direction() {
        let pageable = Pageable::try_from(query(None, None, Some("createdAt,desc"))).unwrap();
        assert_eq!(pageable.sort, SortField::CreatedAt);
        assert_eq!(pageable.direction, Direction::Desc);

        let pageable = Pageable::try_from(query(None, None, Some("title"))).unwrap();
        assert_eq!(pageable.sort, SortField::Title);
        assert_eq!(pageable.direction, Direction::Asc);
    }

    #[test]
    fn rejects_unknown_sort_field() {
        let err = Pageable::try_from(query(None, None, Some("password"))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(Pageable::try_from(query(None, None, Some("id,sideways"))).is_err());
    }

    #[test]
    fn page_metadata() {
        let pageable = Pageable {
            page: 1,
            size: 2,
            ..Pageable::default()
        };
        let page = Page::new(vec![3, 4], &pageable, 5);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);

        let empty: Page<i32> = Page::new(vec![], &Pageable::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.first && empty.last);
    }

    #[test]
    fn huge_page_number_is_the_last_page() {
        let pageable = Pageable::try_from(query(Some(i64::MAX), Some(20), None)).unwrap();
        let page: Page<i32> = Page::new(vec![], &pageable, 5);
        assert_eq!(page.number, i64::MAX);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn blank_title_is_rejected() {
        let req = PostRequest {
            title: " ".into(),
            content: "body".into(),
        };
        assert!(req.validate().is_err());
    }
}
