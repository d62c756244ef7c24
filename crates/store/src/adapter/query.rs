//! Structured filter builder.
//!
//! Produces parameter pairs in the PostgREST operator grammar
//! (`eq.`, `gte.`, `ilike.*x*`, `in.(a,b)`, `or=(...)`). Values flow into
//! these pairs as data; URL encoding is the HTTP client's job and the
//! in-memory backend interprets the same grammar directly.

/// Filter, ordering, and paging parameters for one store request.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality condition on a column.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Greater-or-equal condition.
    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.to_string(), format!("gte.{}", value.to_string())));
        self
    }

    /// Less-or-equal condition.
    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.params.push((column.to_string(), format!("lte.{}", value.to_string())));
        self
    }

    /// Case-insensitive substring match. The pattern must already be
    /// sanitized; wildcards are added here.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.params.push((column.to_string(), format!("ilike.*{pattern}*")));
        self
    }

    /// Case-insensitive substring match over any of several columns.
    pub fn ilike_any(mut self, columns: &[&str], pattern: &str) -> Self {
        let conditions = columns
            .iter()
            .map(|col| format!("{col}.ilike.*{pattern}*"))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push(("or".to_string(), format!("({conditions})")));
        self
    }

    /// Disjunction of raw `column.op.value` conditions.
    pub fn any_of(mut self, conditions: &[String]) -> Self {
        self.params.push(("or".to_string(), format!("({})", conditions.join(","))));
        self
    }

    /// Membership in an identifier set. Identifiers containing list
    /// delimiters are dropped rather than escaped; store-assigned ids
    /// never carry them.
    pub fn in_set(mut self, column: &str, ids: &[String]) -> Self {
        let list = ids
            .iter()
            .filter(|id| !id.contains([',', '(', ')']))
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_string(), format!("in.({list})")));
        self
    }

    /// Order by a column, descending.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{column}.desc")));
        self
    }

    /// Order by a column, ascending.
    pub fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{column}.asc")));
        self
    }

    /// Project the response down to the named columns.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.params.push(("offset".to_string(), offset.to_string()));
        self
    }

    /// Consume the builder into parameter pairs.
    pub fn build(self) -> Vec<(String, String)> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_and_range() {
        let params = Query::new().eq("job_type", "full-time").gte("salary_max", 50_000).lte("salary_min", 80_000).build();

        assert_eq!(params[0], ("job_type".to_string(), "eq.full-time".to_string()));
        assert_eq!(params[1], ("salary_max".to_string(), "gte.50000".to_string()));
        assert_eq!(params[2], ("salary_min".to_string(), "lte.80000".to_string()));
    }

    #[test]
    fn test_ilike_any() {
        let params = Query::new().ilike_any(&["title", "company"], "rust").build();
        assert_eq!(params[0], ("or".to_string(), "(title.ilike.*rust*,company.ilike.*rust*)".to_string()));
    }

    #[test]
    fn test_in_set() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let params = Query::new().in_set("job_id", &ids).build();
        assert_eq!(params[0], ("job_id".to_string(), "in.(a,b,c)".to_string()));
    }

    #[test]
    fn test_in_set_drops_grammar_ids() {
        let ids = vec!["ok".to_string(), "bad,id".to_string()];
        let params = Query::new().in_set("id", &ids).build();
        assert_eq!(params[0].1, "in.(ok)");
    }

    #[test]
    fn test_order_and_paging() {
        let params = Query::new().order_desc("created_at").limit(20).offset(40).build();
        assert_eq!(params[0], ("order".to_string(), "created_at.desc".to_string()));
        assert_eq!(params[1], ("limit".to_string(), "20".to_string()));
        assert_eq!(params[2], ("offset".to_string(), "40".to_string()));
    }
}
