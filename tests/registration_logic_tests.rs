/// Tests for registration API conventions
///
/// Note: These are unit tests that verify the logic is correct.
/// Integration tests would require a running server.

#[cfg(test)]
mod tests {
    #[test]
    fn test_authorization_header_parsing() {
        let auth_header = "Bearer abc123token";
        let token = auth_header.strip_prefix("Bearer ");
        assert_eq!(token, Some("abc123token"));

        let invalid_header = "abc123token";
        let token = invalid_header.strip_prefix("Bearer ");
        assert_eq!(token, None);
    }

    #[test]
    fn test_total_pages_arithmetic() {
        // totalPages = ceil(totalCount / limit)
        let cases: [(i64, i64, i64); 5] =
            [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (35, 12, 3)];

        for (total_count, limit, expected) in cases {
            let total_pages = if total_count == 0 {
                0
            } else {
                (total_count + limit - 1) / limit
            };
            assert_eq!(total_pages, expected);
        }
    }

    #[test]
    fn test_boundary_page_flags() {
        let total_pages = 4_i64;

        let page = 1_i64;
        assert!(!(page > 1), "page 1 has no previous page");
        assert!(page < total_pages);

        let page = 4_i64;
        assert!(page > 1);
        assert!(!(page < total_pages), "last page has no next page");
    }

    #[test]
    fn test_bulk_outcome_counts_add_up() {
        // 7 of 10 succeeded: counts always partition the input
        let successes: Vec<&str> = vec!["c1", "c2", "c3", "c4", "c5", "c6", "c7"];
        let failures: Vec<&str> = vec!["c8", "c9", "c10"];

        assert_eq!(successes.len() + failures.len(), 10);
    }

    #[test]
    fn test_capacity_arithmetic() {
        // A seat is available while enrolled < max_students
        let max_students = 1_i64;
        let mut enrolled = 0_i64;

        assert!(enrolled < max_students);
        enrolled += 1;
        assert!(!(enrolled < max_students), "second enrollment must be refused");
    }
}
