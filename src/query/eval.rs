//! Basic graph pattern evaluation over an in-memory triple set

use super::parser::{OrderKey, PatternTerm, Query, QueryForm, TriplePattern};
use crate::rdf::{Term, Triple, XSD};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Variable bindings for one solution
pub type Binding = HashMap<String, Term>;

/// Triples indexed by subject, predicate and object
pub struct TripleIndex<'a> {
    triples: &'a [Triple],
    by_subject: HashMap<&'a Term, Vec<usize>>,
    by_predicate: HashMap<&'a Term, Vec<usize>>,
    by_object: HashMap<&'a Term, Vec<usize>>,
}

impl<'a> TripleIndex<'a> {
    pub fn new(triples: &'a [Triple]) -> Self {
        let mut by_subject: HashMap<&Term, Vec<usize>> = HashMap::new();
        let mut by_predicate: HashMap<&Term, Vec<usize>> = HashMap::new();
        let mut by_object: HashMap<&Term, Vec<usize>> = HashMap::new();
        for (i, t) in triples.iter().enumerate() {
            by_subject.entry(&t.subject).or_default().push(i);
            by_predicate.entry(&t.predicate).or_default().push(i);
            by_object.entry(&t.object).or_default().push(i);
        }
        Self {
            triples,
            by_subject,
            by_predicate,
            by_object,
        }
    }

    /// Candidate triples for `pattern` under `binding`, using the smallest
    /// applicable index
    fn candidates(&self, pattern: &TriplePattern, binding: &Binding) -> Vec<&'a Triple> {
        let lookups = [
            (resolve(&pattern.subject, binding), &self.by_subject),
            (resolve(&pattern.predicate, binding), &self.by_predicate),
            (resolve(&pattern.object, binding), &self.by_object),
        ];

        let mut best: Option<&Vec<usize>> = None;
        for (term, index) in lookups {
            let Some(term) = term else { continue };
            match (index.get(term), best) {
                (None, _) => return Vec::new(),
                (Some(rows), Some(b)) if rows.len() >= b.len() => {}
                (Some(rows), _) => best = Some(rows),
            }
        }

        let triples: &'a [Triple] = self.triples;
        match best {
            Some(rows) => rows.iter().map(|&i| &triples[i]).collect(),
            None => triples.iter().collect(),
        }
    }
}

fn resolve<'b>(term: &'b PatternTerm, binding: &'b Binding) -> Option<&'b Term> {
    match term {
        PatternTerm::Term(t) => Some(t),
        PatternTerm::Var(v) => binding.get(v),
    }
}

/// Bind `term` against `value`; false when it contradicts an existing binding
fn unify(term: &PatternTerm, value: &Term, binding: &mut Binding) -> bool {
    match term {
        PatternTerm::Term(t) => t == value,
        PatternTerm::Var(v) => match binding.get(v) {
            Some(bound) => bound == value,
            None => {
                binding.insert(v.clone(), value.clone());
                true
            }
        },
    }
}

/// All solutions of the pattern, joined left to right
pub fn solve(index: &TripleIndex<'_>, pattern: &[TriplePattern]) -> Vec<Binding> {
    let mut solutions = vec![Binding::new()];
    for tp in pattern {
        let mut next = Vec::new();
        for binding in &solutions {
            for triple in index.candidates(tp, binding) {
                let mut extended = binding.clone();
                if unify(&tp.subject, &triple.subject, &mut extended)
                    && unify(&tp.predicate, &triple.predicate, &mut extended)
                    && unify(&tp.object, &triple.object, &mut extended)
                {
                    next.push(extended);
                }
            }
        }
        if next.is_empty() {
            return next;
        }
        solutions = next;
    }
    solutions
}

fn numeric_value(term: &Term) -> Option<f64> {
    const NUMERIC: [&str; 8] = [
        "integer", "decimal", "double", "float", "int", "long", "short",
        "nonNegativeInteger",
    ];
    match term {
        Term::Literal {
            value,
            datatype: Some(dt),
            ..
        } => {
            let local = dt.strip_prefix(XSD)?;
            NUMERIC.contains(&local).then(|| value.parse().ok()).flatten()
        }
        _ => None,
    }
}

fn rank(term: Option<&Term>) -> u8 {
    match term {
        None => 0,
        Some(Term::Blank(_)) => 1,
        Some(Term::Iri(_)) => 2,
        Some(Term::Literal { .. }) => 3,
    }
}

/// Unbound < blank nodes < IRIs < literals; numeric literals compare by value
pub fn compare_terms(a: Option<&Term>, b: Option<&Term>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            if let (Some(nx), Some(ny)) = (numeric_value(x), numeric_value(y)) {
                if let Some(ord) = nx.partial_cmp(&ny) {
                    return ord;
                }
            }
            rank(a).cmp(&rank(b)).then_with(|| x.cmp(y))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn order(solutions: &mut [Binding], keys: &[OrderKey]) {
    solutions.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ord = compare_terms(a.get(&key.variable), b.get(&key.variable));
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn slice<T>(rows: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    rows.into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Solutions of a SELECT query: projected variables and rows
pub fn select(index: &TripleIndex<'_>, query: &Query) -> (Vec<String>, Vec<Vec<Option<Term>>>) {
    let (distinct, variables) = match &query.form {
        QueryForm::Select {
            distinct,
            variables,
        } => (
            *distinct,
            variables.clone().unwrap_or_else(|| query.pattern_variables()),
        ),
        QueryForm::Construct { .. } => (false, query.pattern_variables()),
    };

    let mut solutions = solve(index, &query.pattern);
    order(&mut solutions, &query.order_by);

    let mut rows: Vec<Vec<Option<Term>>> = solutions
        .into_iter()
        .map(|binding| variables.iter().map(|v| binding.get(v).cloned()).collect())
        .collect();

    if distinct {
        let mut seen = HashSet::new();
        rows.retain(|row| seen.insert(row.clone()));
    }

    (variables, slice(rows, query.offset, query.limit))
}

fn instantiate(term: &PatternTerm, binding: &Binding) -> Option<Term> {
    resolve(term, binding).cloned()
}

/// Triples produced by a CONSTRUCT template, deduplicated in order.
/// Template triples with unbound variables or a literal subject/predicate
/// are dropped.
pub fn construct(index: &TripleIndex<'_>, query: &Query, template: &[TriplePattern]) -> Vec<Triple> {
    let mut solutions = solve(index, &query.pattern);
    order(&mut solutions, &query.order_by);
    let solutions = slice(solutions, query.offset, query.limit);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for binding in &solutions {
        for tp in template {
            let (Some(s), Some(p), Some(o)) = (
                instantiate(&tp.subject, binding),
                instantiate(&tp.predicate, binding),
                instantiate(&tp.object, binding),
            ) else {
                continue;
            };
            if s.is_literal() || !matches!(p, Term::Iri(_)) {
                continue;
            }
            let triple = Triple::new(s, p, o);
            if seen.insert(triple.clone()) {
                out.push(triple);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;

    fn ex(local: &str) -> Term {
        Term::iri(format!("http://ex.org/{}", local))
    }

    fn int(n: i64) -> Term {
        Term::typed(n.to_string(), format!("{}integer", XSD))
    }

    fn data() -> Vec<Triple> {
        vec![
            Triple::new(ex("a"), ex("knows"), ex("b")),
            Triple::new(ex("b"), ex("knows"), ex("c")),
            Triple::new(ex("a"), ex("age"), int(30)),
            Triple::new(ex("b"), ex("age"), int(9)),
            Triple::new(ex("c"), ex("age"), int(100)),
            Triple::new(ex("c"), ex("knows"), ex("c")),
        ]
    }

    const PREFIX: &str = "PREFIX ex: <http://ex.org/> ";

    #[test]
    fn test_join() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(
            &format!("{}SELECT ?x ?z WHERE {{ ?x ex:knows ?y . ?y ex:knows ?z }}", PREFIX),
            &[],
        )
        .unwrap();
        let (vars, mut rows) = select(&index, &q);
        rows.sort();
        assert_eq!(vars, vec!["x", "z"]);
        assert_eq!(
            rows,
            vec![
                vec![Some(ex("a")), Some(ex("c"))],
                vec![Some(ex("b")), Some(ex("c"))],
                vec![Some(ex("c")), Some(ex("c"))],
            ]
        );
    }

    #[test]
    fn test_repeated_variable() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(&format!("{}SELECT ?x {{ ?x ex:knows ?x }}", PREFIX), &[]).unwrap();
        let (_, rows) = select(&index, &q);
        assert_eq!(rows, vec![vec![Some(ex("c"))]]);
    }

    #[test]
    fn test_numeric_order_and_slice() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(
            &format!("{}SELECT ?p ?age {{ ?p ex:age ?age }} ORDER BY DESC(?age)", PREFIX),
            &[],
        )
        .unwrap();
        let (_, rows) = select(&index, &q);
        let ages: Vec<Term> = rows.into_iter().filter_map(|r| r[1].clone()).collect();
        // 100 > 30 > 9 numerically, not lexically
        assert_eq!(ages, vec![int(100), int(30), int(9)]);

        let q = parse_query(
            &format!("{}SELECT ?p {{ ?p ex:age ?age }} ORDER BY ?age LIMIT 1 OFFSET 1", PREFIX),
            &[],
        )
        .unwrap();
        assert_eq!(select(&index, &q).1, vec![vec![Some(ex("a"))]]);
    }

    #[test]
    fn test_distinct_and_star() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(&format!("{}SELECT DISTINCT ?x {{ ?x ex:knows ?y }}", PREFIX), &[])
            .unwrap();
        assert_eq!(select(&index, &q).1.len(), 3);

        let q = parse_query(&format!("{}SELECT * {{ ?s ex:age ?a }}", PREFIX), &[]).unwrap();
        let (vars, rows) = select(&index, &q);
        assert_eq!(vars, vec!["s", "a"]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_no_match() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(&format!("{}SELECT ?x {{ ?x ex:missing ?y }}", PREFIX), &[]).unwrap();
        assert!(select(&index, &q).1.is_empty());
    }

    #[test]
    fn test_construct_dedup() {
        let triples = data();
        let index = TripleIndex::new(&triples);
        let q = parse_query(
            &format!(
                "{}CONSTRUCT {{ ?x ex:acquainted ex:someone . ?y ex:age ?unbound }} WHERE {{ ?x ex:knows ?y }}",
                PREFIX
            ),
            &[],
        )
        .unwrap();
        let QueryForm::Construct { template } = &q.form else {
            panic!("expected CONSTRUCT");
        };
        let out = construct(&index, &q, template);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|t| t.predicate == ex("acquainted")));
    }

    #[test]
    fn test_term_ordering() {
        assert_eq!(compare_terms(None, Some(&ex("a"))), Ordering::Less);
        assert_eq!(
            compare_terms(Some(&Term::Blank("b".into())), Some(&ex("a"))),
            Ordering::Less
        );
        assert_eq!(
            compare_terms(Some(&Term::literal("a")), Some(&ex("z"))),
            Ordering::Greater
        );
    }
}
