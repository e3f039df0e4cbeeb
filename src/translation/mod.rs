//! Portable SQL dialect and its rewrite into backend-native placeholder syntax.
//!
//! The dialect accepts numbered placeholders (`?1`), named placeholders (`:name`, `@name`,
//! `$name`) and two templates for sequence-generated keys:
//!
//! * `{if_seq <column><rest>}` renders the column (and the text up to `}`) only on backends whose
//!   inserts name the key column explicitly,
//! * `{next <sequence><rest>}` renders the backend's "next value of sequence" expression.
//!
//! Quoted literals and comments are never scanned for placeholders.
use std::collections::HashMap;

use tracing::trace;

use crate::error::DbLibError;
use crate::identifier::IndexOrName;

mod parsers;
mod scanner;

use scanner::{Token, scan_token};

/// Rendering callbacks a backend supplies to the preprocessor.
///
/// `param_text` is the placeholder as written by the caller (sigil included) and `param_index`
/// the 1-based native slot assigned to it.
pub trait SqlPreprocessorActions {
    fn append_index_param_to_sql(&self, param_text: &str, param_index: usize, sql: &mut String);
    fn append_named_param_to_sql(&self, param_text: &str, param_index: usize, sql: &mut String);
    fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String);
    fn append_seq_generator(&self, seq_name: &str, other: &str, sql: &mut String);
}

/// User identifiers mapped to their native slots, in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct ParamIndexMap {
    entries: Vec<(IndexOrName, Vec<usize>)>,
    lookup: HashMap<IndexOrName, usize>,
    native_count: usize,
}

impl ParamIndexMap {
    /// Every occurrence appends to the identifier's slot list; with `coalescing` the appended
    /// slot is the identifier's first one and no native slot is allocated.
    fn assign(&mut self, param: IndexOrName, coalescing: bool) -> usize {
        if let Some(&pos) = self.lookup.get(&param) {
            let slots = &mut self.entries[pos].1;
            if coalescing && let Some(&first) = slots.first() {
                slots.push(first);
                return first;
            }
            self.native_count += 1;
            slots.push(self.native_count);
            return self.native_count;
        }
        self.native_count += 1;
        self.lookup.insert(param.clone(), self.entries.len());
        self.entries.push((param, vec![self.native_count]));
        self.native_count
    }

    /// Native slots recorded for `param`, one per occurrence.
    #[must_use]
    pub fn get(&self, param: &IndexOrName) -> Option<&[usize]> {
        self.lookup
            .get(param)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    /// Number of distinct native slots allocated.
    #[must_use]
    pub fn native_count(&self) -> usize {
        self.native_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexOrName, &[usize])> {
        self.entries
            .iter()
            .map(|(param, slots)| (param, slots.as_slice()))
    }
}

/// Output of one preprocessing pass.
#[derive(Debug, Clone)]
pub struct PreprocessedSql {
    pub sql: String,
    pub params: ParamIndexMap,
}

/// Rewrite `sql` into native syntax.
///
/// With `use_native_parameter_syntax` placeholders are copied through and the map stays empty.
/// Otherwise each placeholder is rendered by `actions` against a native slot; with
/// `supports_indexed_param_coalescing` a repeated identifier reuses its first slot.
///
/// ```rust
/// use sql_dblib::translation::{SqlPreprocessorActions, preprocess};
///
/// struct Dollar;
/// impl SqlPreprocessorActions for Dollar {
///     fn append_index_param_to_sql(&self, _: &str, i: usize, sql: &mut String) {
///         sql.push_str(&format!("${i}"));
///     }
///     fn append_named_param_to_sql(&self, _: &str, i: usize, sql: &mut String) {
///         sql.push_str(&format!("${i}"));
///     }
///     fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String) {
///         sql.push_str(data);
///         sql.push_str(other);
///     }
///     fn append_seq_generator(&self, name: &str, other: &str, sql: &mut String) {
///         sql.push_str(&format!("nextval('{name}'){other}"));
///     }
/// }
///
/// let out = preprocess("select :a, ?3, :A from t where s = ':a'", false, true, &Dollar);
/// assert_eq!(out.sql, "select $1, $2, $1 from t where s = ':a'");
/// assert_eq!(out.params.native_count(), 2);
/// ```
#[must_use]
pub fn preprocess<A>(
    sql: &str,
    use_native_parameter_syntax: bool,
    supports_indexed_param_coalescing: bool,
    actions: &A,
) -> PreprocessedSql
where
    A: SqlPreprocessorActions + ?Sized,
{
    let mut pass = Pass {
        use_native: use_native_parameter_syntax,
        coalescing: supports_indexed_param_coalescing,
        actions,
        params: ParamIndexMap::default(),
    };
    let mut out = String::with_capacity(sql.len() + 16);
    pass.run(sql, &mut out);
    PreprocessedSql {
        sql: out,
        params: pass.params,
    }
}

struct Pass<'a, A: ?Sized> {
    use_native: bool,
    coalescing: bool,
    actions: &'a A,
    params: ParamIndexMap,
}

impl<A> Pass<'_, A>
where
    A: SqlPreprocessorActions + ?Sized,
{
    fn run(&mut self, sql: &str, out: &mut String) {
        let mut copied = 0;
        let mut idx = 0;
        while idx < sql.len() {
            let Some((token, end)) = scan_token(sql, idx) else {
                idx += 1;
                continue;
            };
            if token != Token::Verbatim {
                out.push_str(&sql[copied..idx]);
                self.emit(token, out);
                copied = end;
            }
            idx = end;
        }
        out.push_str(&sql[copied..]);
    }

    fn emit(&mut self, token: Token<'_>, out: &mut String) {
        match token {
            Token::IndexParam { text, ordinal } => {
                if self.use_native {
                    out.push_str(text);
                } else {
                    let slot = self
                        .params
                        .assign(IndexOrName::Index(ordinal), self.coalescing);
                    trace!(param = text, slot, "indexed placeholder");
                    self.actions.append_index_param_to_sql(text, slot, out);
                }
            }
            Token::NamedParam(text) => {
                if self.use_native {
                    out.push_str(text);
                } else {
                    let slot = self
                        .params
                        .assign(IndexOrName::Name(text.to_string()), self.coalescing);
                    trace!(param = text, slot, "named placeholder");
                    self.actions.append_named_param_to_sql(text, slot, out);
                }
            }
            Token::SlashComment(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Token::IfSeq { data, other } => {
                let mut rendered = String::with_capacity(data.len());
                self.run(data, &mut rendered);
                self.actions.append_if_seq_data(&rendered, other, out);
            }
            Token::Next { name, other } => self.actions.append_seq_generator(name, other, out),
            Token::Verbatim => {}
        }
    }
}

/// Per-statement holder of the last preprocessing result.
#[derive(Debug, Clone, Default)]
pub struct SqlPreprocessor {
    use_native: bool,
    params: ParamIndexMap,
}

impl SqlPreprocessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preprocess `sql`, replacing any previous map, and return the native SQL.
    pub fn preprocess<A>(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
        supports_indexed_param_coalescing: bool,
        actions: &A,
    ) -> String
    where
        A: SqlPreprocessorActions + ?Sized,
    {
        let out = preprocess(
            sql,
            use_native_parameter_syntax,
            supports_indexed_param_coalescing,
            actions,
        );
        self.use_native = use_native_parameter_syntax;
        self.params = out.params;
        out.sql
    }

    #[must_use]
    pub fn params(&self) -> &ParamIndexMap {
        &self.params
    }

    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.use_native
    }

    /// Call `fun` for every native slot behind `param`, stopping at the first error.
    ///
    /// # Errors
    /// Returns `DbLibError::ParameterNotFound` if `param` did not occur in the SQL (or is a name
    /// while in pass-through mode), or the first error returned by `fun`.
    pub fn do_for_param_indexes<F>(&self, param: &IndexOrName, mut fun: F) -> Result<(), DbLibError>
    where
        F: FnMut(usize) -> Result<(), DbLibError>,
    {
        if self.use_native {
            return match param {
                IndexOrName::Index(i) => fun(*i),
                IndexOrName::Name(_) => Err(DbLibError::ParameterNotFound(param.to_string())),
            };
        }
        let slots = self
            .params
            .get(param)
            .ok_or_else(|| DbLibError::ParameterNotFound(param.to_string()))?;
        for &slot in slots {
            fun(slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders placeholders as `$I<n>` / `$N<name>` so tests can see what was substituted.
    struct TestActions;

    impl SqlPreprocessorActions for TestActions {
        fn append_index_param_to_sql(&self, param_text: &str, _: usize, sql: &mut String) {
            sql.push_str("$I");
            sql.push_str(&param_text[1..]);
        }

        fn append_named_param_to_sql(&self, param_text: &str, _: usize, sql: &mut String) {
            sql.push_str("$N");
            sql.push_str(param_text);
        }

        fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String) {
            sql.push_str(data);
            sql.push_str(other);
        }

        fn append_seq_generator(&self, seq_name: &str, other: &str, sql: &mut String) {
            sql.push_str("gen_id(");
            sql.push_str(seq_name);
            sql.push_str(", 1)");
            sql.push_str(other);
        }
    }

    /// Renders the slot number, like a positional wire protocol.
    struct SlotActions;

    impl SqlPreprocessorActions for SlotActions {
        fn append_index_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
            sql.push_str(&format!("${param_index}"));
        }

        fn append_named_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
            sql.push_str(&format!("${param_index}"));
        }

        fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String) {
            sql.push_str(data);
            sql.push_str(other);
        }

        fn append_seq_generator(&self, _: &str, _: &str, _: &mut String) {}
    }

    fn rewrite(sql: &str) -> String {
        preprocess(sql, false, true, &TestActions).sql
    }

    fn slots(map: &ParamIndexMap, param: impl Into<IndexOrName>) -> Vec<usize> {
        map.get(&param.into()).map(<[usize]>::to_vec).unwrap_or_default()
    }

    #[test]
    fn substitutes_placeholders() {
        assert_eq!(rewrite("test"), "test");
        assert_eq!(rewrite("?1?2"), "$I1$I2");
        assert_eq!(rewrite("?1aaa"), "$I1aaa");
        assert_eq!(rewrite("test @aaa%"), "test $N@aaa%");
        assert_eq!(rewrite("a = :x or b = $y"), "a = $N:x or b = $N$y");
    }

    #[test]
    fn leaves_literals_untouched() {
        assert_eq!(rewrite("test '?1 ?2'"), "test '?1 ?2'");
        assert_eq!(rewrite("test 'aaa''aaa ?1' ?1"), "test 'aaa''aaa ?1' $I1");
        assert_eq!(rewrite(r#"x "col ?1 "" :a" ?2"#), r#"x "col ?1 "" :a" $I2"#);
        assert_eq!(rewrite(r"x 'it\'s ?1' ?2"), r"x 'it\'s ?1' $I2");
    }

    #[test]
    fn leaves_comments_untouched() {
        assert_eq!(rewrite("a /* ?1 :b */ ?2"), "a /* ?1 :b */ $I2");
        assert_eq!(rewrite("a -- ?1\n?2"), "a -- ?1\n$I2");
        assert_eq!(rewrite("a // ?1\n?2"), "a // ?1\n$I2");
        assert_eq!(rewrite("a // ?1"), "a // ?1\n");
    }

    #[test]
    fn casts_are_not_parameters() {
        assert_eq!(rewrite("select ?1::int, :a::text"), "select $I1::int, $N:a::text");
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(
            rewrite("select 'héllo ?1', ?1 -- ünï\n"),
            "select 'héllo ?1', $I1 -- ünï\n"
        );
    }

    #[test]
    fn sequence_templates() {
        assert_eq!(
            rewrite("insert into tbl(text, {if_seq id}) values('aaaa', {next id_gen})"),
            "insert into tbl(text, id) values('aaaa', gen_id(id_gen, 1))"
        );
        assert_eq!(
            rewrite("insert into tbl({if_seq id,} text) values({next id_gen,} 'aaaa')"),
            "insert into tbl(id, text) values(gen_id(id_gen, 1), 'aaaa')"
        );
    }

    #[test]
    fn if_seq_data_is_preprocessed_with_shared_slots() {
        let out = preprocess("values({if_seq :id,} :name, :id)", false, false, &SlotActions);
        assert_eq!(out.sql, "values($1, $2, $3)");
        assert_eq!(slots(&out.params, ":id"), vec![1, 3]);
        assert_eq!(slots(&out.params, ":name"), vec![2]);
    }

    #[test]
    fn coalescing_toggle() {
        let on = preprocess(":aaa ?3 :AAA", false, true, &SlotActions);
        assert_eq!(on.sql, "$1 $2 $1");
        assert_eq!(slots(&on.params, ":aaa"), vec![1, 1]);
        assert_eq!(on.params.native_count(), 2);

        let off = preprocess(":aaa ?3 :AAA", false, false, &SlotActions);
        assert_eq!(off.sql, "$1 $2 $3");
        assert_eq!(slots(&off.params, ":aaa"), vec![1, 3]);
        assert_eq!(slots(&off.params, 3usize), vec![2]);
        assert_eq!(off.params.native_count(), 3);
    }

    #[test]
    fn sigils_are_distinct_identifiers() {
        let out = preprocess(":a @a $a", false, true, &SlotActions);
        assert_eq!(out.sql, "$1 $2 $3");
        assert_eq!(out.params.len(), 3);
    }

    #[test]
    fn pass_through_copies_placeholders() {
        let out = preprocess("select ?1, :a, {next s,} x", true, true, &TestActions);
        assert_eq!(out.sql, "select ?1, :a, gen_id(s, 1), x");
        assert!(out.params.is_empty());
    }

    #[test]
    fn fan_out_visits_every_slot() -> Result<(), DbLibError> {
        let mut pp = SqlPreprocessor::new();
        pp.preprocess("?2 :x ?2 :X", false, false, &SlotActions);

        let mut seen = Vec::new();
        pp.do_for_param_indexes(&":x".into(), |slot| {
            seen.push(slot);
            Ok(())
        })?;
        assert_eq!(seen, vec![2, 4]);

        let missing = pp.do_for_param_indexes(&1usize.into(), |_| Ok(()));
        assert!(matches!(missing, Err(DbLibError::ParameterNotFound(p)) if p == "1"));
        Ok(())
    }

    #[test]
    fn pass_through_forwards_ordinals() -> Result<(), DbLibError> {
        let mut pp = SqlPreprocessor::new();
        pp.preprocess("select $7", true, false, &SlotActions);
        assert!(pp.is_pass_through());

        let mut seen = Vec::new();
        pp.do_for_param_indexes(&7usize.into(), |slot| {
            seen.push(slot);
            Ok(())
        })?;
        assert_eq!(seen, vec![7]);
        assert!(pp.do_for_param_indexes(&"$x".into(), |_| Ok(())).is_err());
        Ok(())
    }

    #[test]
    fn fan_out_stops_on_first_error() {
        let mut pp = SqlPreprocessor::new();
        pp.preprocess(":a :a :a", false, false, &SlotActions);
        let mut calls = 0;
        let res = pp.do_for_param_indexes(&":a".into(), |_| {
            calls += 1;
            Err(DbLibError::Other("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(calls, 1);
    }
}
