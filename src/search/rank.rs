//! Ranking and grouping of a catalog against an effective query.
//!
//! Three paths:
//! - empty query: every visible choice in registry order
//! - ungrouped catalogs: fuzzy hits ordered by where the query occurs in the
//!   name, with a linear substring scan when the index finds nothing
//! - grouped catalogs: exact name matches float to an "Exact Match" block,
//!   relevance-matched choices keep their groups, `lastGroup` matches trail,
//!   empty group headers are pruned and an alias match always comes first

use crate::registry::Catalog;
use crate::types::{Choice, Pass, ScoredChoice, SearchKey};
use ahash::{AHashMap, AHashSet};

use super::index::IndexHit;
use super::scoring::{linear_scan, name_position_key, substring_span};

pub const EXACT_MATCH_GROUP: &str = "Exact Match";
pub const ALIAS_GROUP: &str = "Alias";
pub const LAST_MATCH_GROUP: &str = "Last Match";
const PASS_GROUP: &str = "Pass";

/// Ranks `catalog` for `query`. Pure: identical inputs give identical output.
pub fn rank(catalog: &Catalog, query: &str) -> Vec<ScoredChoice> {
    if catalog.is_generated() {
        return catalog
            .choices()
            .iter()
            .cloned()
            .map(ScoredChoice::unscored)
            .collect();
    }

    let ranked = if query.is_empty() {
        rank_empty(catalog)
    } else if catalog.has_group() {
        rank_grouped(catalog, query)
    } else {
        rank_ungrouped(catalog, query)
    };

    tracing::debug!(
        "Ranked {} of {} choices for '{}'",
        ranked.len(),
        catalog.len(),
        query
    );
    ranked
}

fn rank_empty(catalog: &Catalog) -> Vec<ScoredChoice> {
    let visible: Vec<ScoredChoice> = catalog
        .choices()
        .iter()
        .filter(|choice| !choice.miss && !choice.pass.is_set() && !choice.hide_without_input)
        .cloned()
        .map(ScoredChoice::unscored)
        .collect();

    if !visible.is_empty() {
        return visible;
    }

    catalog
        .choices()
        .iter()
        .filter(|choice| choice.miss || choice.info)
        .cloned()
        .map(ScoredChoice::unscored)
        .collect()
}

fn rank_ungrouped(catalog: &Catalog, query: &str) -> Vec<ScoredChoice> {
    if catalog.index().is_empty() {
        return Vec::new();
    }

    let hits = catalog.index().search(query);
    if hits.is_empty() {
        tracing::debug!("No fuzzy matches for '{}', falling back to linear scan", query);
        return linear_scan(catalog.choices(), catalog.keys(), query);
    }

    let query_lower = query.to_lowercase();
    let mut results: Vec<ScoredChoice> = hits
        .into_iter()
        .filter(|hit| !catalog.choices()[hit.position].miss)
        .map(|hit| scored_from_hit(catalog, hit))
        .collect();

    results.sort_by_key(|result| name_position_key(&result.item, &query_lower));
    results
}

/// Membership bookkeeping for one group while classifying the grouped path.
#[derive(Debug, Default)]
struct GroupTally {
    count: usize,
    header_index: Option<usize>,
}

#[derive(Debug, Default)]
struct Buckets {
    alias: Option<ScoredChoice>,
    starts_with: Vec<ScoredChoice>,
    includes: Vec<ScoredChoice>,
    match_last: Vec<ScoredChoice>,
    middle: Vec<ScoredChoice>,
    miss: Vec<ScoredChoice>,
}

fn rank_grouped(catalog: &Catalog, query: &str) -> Vec<ScoredChoice> {
    let query_lower = query.to_lowercase();
    let hits = catalog.index().search(query);

    let mut groups_in_result: AHashSet<&str> = AHashSet::new();
    for hit in &hits {
        if let Some(group) = catalog.choices()[hit.position].group.as_deref() {
            groups_in_result.insert(group);
        }
    }
    let mut hits_by_position: AHashMap<usize, IndexHit> =
        hits.into_iter().map(|hit| (hit.position, hit)).collect();
    let mut tallies: AHashMap<&str, GroupTally> = AHashMap::new();
    let mut buckets = Buckets::default();

    for (position, choice) in catalog.choices().iter().enumerate() {
        let hit = hits_by_position.remove(&position);

        if choice.alias.as_deref() == Some(query) {
            let mut alias = choice.clone();
            alias.pass = Pass::Flag(false);
            alias.group = Some(ALIAS_GROUP.to_string());
            buckets.alias = Some(with_hit_matches(alias, hit));
            continue;
        }

        if !choice.skip
            && !choice.miss
            && let Some(span) = substring_span(&choice.name, &query_lower)
        {
            if choice.last_group {
                buckets.match_last.push(with_hit_matches(choice.clone(), hit));
                continue;
            }

            let mut exact = choice.clone();
            exact.pass = Pass::Flag(false);
            exact.exact = true;
            if exact.group.as_deref() != Some(PASS_GROUP) && exact.tag.is_none() {
                exact.tag = exact.kenv.clone().or_else(|| exact.group.clone());
            }
            let entry = with_hit_matches(exact, hit).with_span(SearchKey::Name, span);
            if span.start == 0 {
                buckets.starts_with.push(entry);
            } else {
                buckets.includes.push(entry);
            }
            continue;
        }

        // A non-empty query never hides `hideWithoutInput` choices here.
        if choice.miss {
            buckets.miss.push(ScoredChoice::unscored(choice.clone()));
        } else if choice.pass.is_set() {
            buckets.middle.push(ScoredChoice::unscored(choice.clone()));
        } else if let Some(hit) = hit {
            if choice.last_group {
                buckets.match_last.push(with_hit_matches(choice.clone(), Some(hit)));
            } else {
                buckets.middle.push(with_hit_matches(choice.clone(), Some(hit)));
                if let Some(group) = choice.group.as_deref() {
                    tallies.entry(group).or_default().count += 1;
                }
            }
        } else if choice.skip
            && let Some(group) = choice.group.as_deref()
            && groups_in_result.contains(group)
        {
            let tally = tallies.entry(group).or_default();
            if tally.header_index.is_none() {
                tally.header_index = Some(buckets.middle.len());
                buckets.middle.push(ScoredChoice::unscored(choice.clone()));
            }
        }
    }

    prune_empty_headers(&mut buckets.middle, &tallies);

    tracing::debug!(
        "Grouped buckets for '{}': alias={} starts_with={} includes={} middle={} last={} miss={}",
        query,
        buckets.alias.is_some(),
        buckets.starts_with.len(),
        buckets.includes.len(),
        buckets.middle.len(),
        buckets.match_last.len(),
        buckets.miss.len()
    );

    assemble(buckets)
}

/// Removes headers of groups that ended up with no members.
fn prune_empty_headers(middle: &mut Vec<ScoredChoice>, tallies: &AHashMap<&str, GroupTally>) {
    let mut empty: Vec<usize> = tallies
        .values()
        .filter(|tally| tally.count == 0)
        .filter_map(|tally| tally.header_index)
        .collect();
    empty.sort_unstable_by(|a, b| b.cmp(a));
    for index in empty {
        middle.remove(index);
    }
}

fn assemble(buckets: Buckets) -> Vec<ScoredChoice> {
    let Buckets {
        alias,
        mut starts_with,
        includes,
        mut match_last,
        mut middle,
        miss,
    } = buckets;

    if !starts_with.is_empty() || !includes.is_empty() {
        sort_keywords_first(&mut starts_with);
        let mut exact = Vec::with_capacity(1 + starts_with.len() + includes.len() + middle.len());
        exact.push(ScoredChoice::unscored(Choice::header(EXACT_MATCH_GROUP)));
        exact.extend(starts_with);
        exact.extend(includes);
        exact.append(&mut middle);
        middle = exact;
    }

    if !match_last.is_empty() {
        sort_keywords_first(&mut match_last);
        let group = match_last[0]
            .item
            .group
            .clone()
            .unwrap_or_else(|| LAST_MATCH_GROUP.to_string());
        middle.push(ScoredChoice::unscored(Choice::header(&group)));
        middle.extend(match_last);
    }

    if middle.is_empty() {
        middle = miss;
    }

    if let Some(alias) = alias {
        let mut front = Vec::with_capacity(2 + middle.len());
        front.push(ScoredChoice::unscored(Choice::header(ALIAS_GROUP)));
        front.push(alias);
        front.extend(middle);
        middle = front;
    }

    middle
}

/// Stable sort putting keyword-bearing choices first.
fn sort_keywords_first(entries: &mut [ScoredChoice]) {
    entries.sort_by_key(|entry| entry.item.keyword.is_none());
}

fn scored_from_hit(catalog: &Catalog, hit: IndexHit) -> ScoredChoice {
    ScoredChoice {
        item: catalog.choices()[hit.position].clone(),
        score: hit.score,
        matches: hit.matches,
    }
}

fn with_hit_matches(item: Choice, hit: Option<IndexHit>) -> ScoredChoice {
    match hit {
        Some(hit) => ScoredChoice {
            item,
            score: hit.score,
            matches: hit.matches,
        },
        None => ScoredChoice::unscored(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn catalog(choices: Vec<Choice>) -> Catalog {
        Catalog::build(choices, &[SearchKey::Name])
    }

    fn names(results: &[ScoredChoice]) -> Vec<&str> {
        results.iter().map(|r| r.item.name.as_str()).collect()
    }

    #[test]
    fn generated_catalog_ignores_query() {
        let catalog = Catalog::generated(
            vec![Choice::new("b"), Choice::new("a")],
            &[SearchKey::Name],
        );
        check!(names(&rank(&catalog, "zzz")) == vec!["b", "a"]);
    }

    #[test]
    fn empty_query_falls_back_to_miss_and_info() {
        let mut miss = Choice::new("Miss");
        miss.miss = true;
        let mut hidden = Choice::new("Hidden");
        hidden.hide_without_input = true;
        let results = rank(&catalog(vec![hidden, miss]), "");
        check!(names(&results) == vec!["Miss"]);
    }

    #[test]
    fn ungrouped_hits_sort_by_name_position() {
        let results = rank(
            &catalog(vec![Choice::new("Force Quit"), Choice::new("Quit All")]),
            "quit",
        );
        check!(names(&results) == vec!["Quit All", "Force Quit"]);
    }

    #[test]
    fn ungrouped_drops_miss_hits() {
        let mut miss = Choice::new("quit anyway");
        miss.miss = true;
        let results = rank(&catalog(vec![miss, Choice::new("Quit")]), "quit");
        check!(names(&results) == vec!["Quit"]);
    }

    #[test]
    fn prune_removes_descending_without_shifting() {
        let mut middle: Vec<ScoredChoice> = ["H1", "a", "H2", "H3", "b"]
            .iter()
            .map(|n| ScoredChoice::unscored(Choice::new(*n)))
            .collect();
        let mut tallies = AHashMap::new();
        tallies.insert(
            "G1",
            GroupTally {
                count: 0,
                header_index: Some(0),
            },
        );
        tallies.insert(
            "G2",
            GroupTally {
                count: 0,
                header_index: Some(2),
            },
        );
        tallies.insert(
            "G3",
            GroupTally {
                count: 1,
                header_index: Some(3),
            },
        );
        prune_empty_headers(&mut middle, &tallies);
        check!(names(&middle) == vec!["a", "H3", "b"]);
    }

    #[test]
    fn last_group_exact_match_trails_under_its_group_header() {
        let mut recent = Choice::new("Recent Note").with_group("Recent");
        recent.last_group = true;
        let results = rank(
            &catalog(vec![recent, Choice::new("Note Pad").with_group("Apps")]),
            "note",
        );
        check!(names(&results) == vec!["Exact Match", "Note Pad", "Recent", "Recent Note"]);
    }

    #[test]
    fn exact_clone_defaults_tag_to_kenv_then_group() {
        let mut scripted = Choice::new("Deploy").with_group("Scripts");
        scripted.kenv = Some("work".to_string());
        let results = rank(
            &catalog(vec![scripted, Choice::new("Deploy Docs").with_group("Scripts")]),
            "deploy",
        );
        check!(results[1].item.tag.as_deref() == Some("work"));
        check!(results[1].item.exact);
        check!(results[2].item.tag.as_deref() == Some("Scripts"));
    }

    #[test]
    fn pass_group_keeps_tag_empty() {
        let results = rank(&catalog(vec![Choice::new("Echo").with_group("Pass")]), "echo");
        check!(results[1].item.tag.is_none());
    }

    #[test]
    fn keyword_bearing_exact_matches_sort_first() {
        let mut keyed = Choice::new("Search Files").with_group("Tools");
        keyed.keyword = Some("sf".to_string());
        let results = rank(
            &catalog(vec![Choice::new("Search Web").with_group("Tools"), keyed]),
            "search",
        );
        check!(names(&results) == vec!["Exact Match", "Search Files", "Search Web"]);
    }
}
