use crate::types::ApiError;

/// What a listing was asked for, which decides how an empty result reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listed {
    AllArticles,
    TopicArticles,
    ArticleComments,
}

impl Listed {
    pub fn when_empty(self) -> ApiError {
        match self {
            Listed::AllArticles => ApiError::NotFound(Some("articles not found")),
            Listed::TopicArticles => ApiError::NotFound(Some("topic not found")),
            // Comment listings answer 404 with an empty object.
            Listed::ArticleComments => ApiError::NotFound(None),
        }
    }
}

pub fn non_empty<T>(rows: Vec<T>, listed: Listed) -> Result<Vec<T>, ApiError> {
    if rows.is_empty() {
        Err(listed.when_empty())
    } else {
        Ok(rows)
    }
}

/// The first row of a single-row lookup, or `NotFound(missing)`.
pub fn single<T>(rows: Vec<T>, missing: &'static str) -> Result<T, ApiError> {
    rows.into_iter()
        .next()
        .ok_or(ApiError::NotFound(Some(missing)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Listed::AllArticles, ApiError::NotFound(Some("articles not found")))]
    #[case(Listed::TopicArticles, ApiError::NotFound(Some("topic not found")))]
    #[case(Listed::ArticleComments, ApiError::NotFound(None))]
    fn empty_listings(#[case] listed: Listed, #[case] expected: ApiError) {
        assert_eq!(non_empty(Vec::<u8>::new(), listed), Err(expected));
    }

    #[test]
    fn rows_pass_through() {
        assert_eq!(non_empty(vec![1, 2], Listed::AllArticles), Ok(vec![1, 2]));
    }

    #[test]
    fn single_row_lookups() {
        assert_eq!(single(vec!["a", "b"], "article not found"), Ok("a"));
        assert_eq!(
            single(Vec::<&str>::new(), "user not found"),
            Err(ApiError::NotFound(Some("user not found")))
        );
    }
}
