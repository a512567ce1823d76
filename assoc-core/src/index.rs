use std::collections::BTreeMap;
use std::io::BufRead;
use std::iter::FromIterator;
use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use crate::{Error, Result, SearchTermsReader};

/// Number of hits a gene search returns at most.
pub const MAX_SEARCH_RESULTS: usize = 5;

lazy_static! {
    static ref CANONICAL_GENE_ID: Regex = Regex::new(r"^ENSG\d{11}$").unwrap();
    static ref GENE_ID_LIKE: Regex = Regex::new(r"^ENSGR?\d+$").unwrap();
}

/// `ENSG` or `ENSGR` followed by digits and nothing else.
pub(crate) fn is_gene_id(text: &str) -> bool {
    GENE_ID_LIKE.is_match(text)
}

#[derive(Debug, Default, Eq, PartialEq)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    docs: IndexSet<String>,
}

/// Upper-cased search terms mapped to the documents registered under them.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct PrefixTrie {
    root: TrieNode,
    terms: usize,
}

/// One indexed term and every document registered under it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SearchMatch<'a> {
    pub word: String,
    pub docs: Vec<&'a str>,
}

impl PrefixTrie {
    pub fn new() -> PrefixTrie {
        PrefixTrie::default()
    }

    pub fn add(&mut self, term: &str, doc: &str) {
        let mut node = &mut self.root;
        for c in term.to_uppercase().chars() {
            node = node.children.entry(c).or_default();
        }
        if node.docs.is_empty() {
            self.terms += 1;
        }
        node.docs.insert(doc.to_string());
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms == 0
    }

    fn node(&self, term: &str) -> Option<&TrieNode> {
        term.to_uppercase()
            .chars()
            .try_fold(&self.root, |node, c| node.children.get(&c))
    }

    /// Documents registered under exactly `term`, in registration order.
    pub fn get(&self, term: &str) -> Vec<&str> {
        self.node(term)
            .map(|node| node.docs.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every term starting with `prefix`, in lexicographic order.
    ///
    /// Terms are produced lazily so callers that only want the first few
    /// matches never walk the rest of the subtree.
    pub fn search<'a>(&'a self, prefix: &str) -> PrefixMatches<'a> {
        let prefix = prefix.to_uppercase();
        let stack = match self.node(&prefix) {
            Some(node) => vec![(prefix, node)],
            None => Vec::new(),
        };
        PrefixMatches { stack }
    }
}

impl<'t> FromIterator<(&'t str, &'t str)> for PrefixTrie {
    fn from_iter<I: IntoIterator<Item=(&'t str, &'t str)>>(iter: I) -> Self {
        let mut trie = PrefixTrie::new();
        for (term, doc) in iter {
            trie.add(term, doc);
        }
        trie
    }
}

/// Depth-first walk over a trie subtree.
pub struct PrefixMatches<'a> {
    stack: Vec<(String, &'a TrieNode)>,
}

impl<'a> Iterator for PrefixMatches<'a> {
    type Item = SearchMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((word, node)) = self.stack.pop() {
            for (c, child) in node.children.iter().rev() {
                let mut child_word = word.clone();
                child_word.push(*c);
                self.stack.push((child_word, child));
            }
            if !node.docs.is_empty() {
                let docs = node.docs.iter().map(String::as_str).collect();
                return Some(SearchMatch { word, docs });
            }
        }
        None
    }
}

/// A gene search result: what to show and where it leads.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SearchHit {
    pub label: String,
    pub url: String,
}

impl SearchHit {
    fn gene(label: String, gene_id: &str) -> SearchHit {
        SearchHit { label, url: format!("/gene/{}", gene_id) }
    }
}

/// Gene lookup by symbol, alias or id prefix.
#[derive(Debug, Default)]
pub struct GeneSearch {
    trie: PrefixTrie,
}

impl GeneSearch {
    pub fn new(trie: PrefixTrie) -> GeneSearch {
        GeneSearch { trie }
    }

    /// Builds the index from a newline-delimited search terms stream.
    pub fn from_reader<B: BufRead>(reader: B) -> Result<GeneSearch> {
        let mut trie = PrefixTrie::new();
        let mut genes = 0;
        for line in SearchTermsReader::new(reader) {
            let terms = line?;
            for term in &terms.1 {
                trie.add(term, &terms.0);
            }
            genes += 1;
        }
        tracing::info!("indexed {} search terms for {} genes", trie.len(), genes);
        Ok(GeneSearch { trie })
    }

    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_uppercase();
        if CANONICAL_GENE_ID.is_match(&query) {
            return vec![SearchHit::gene(query.clone(), &query)];
        }

        self.trie.search(&query)
            .flat_map(|SearchMatch { word, docs }| {
                let ambiguous = docs.len() > 1;
                docs.into_iter().map(move |gene_id| {
                    let label = if ambiguous {
                        format!("{} ({})", word, gene_id)
                    } else {
                        word.clone()
                    };
                    SearchHit::gene(label, gene_id)
                })
            })
            .take(MAX_SEARCH_RESULTS)
            .collect()
    }

    /// Turns a gene id or an exact search term into a single gene id.
    pub fn resolve(&self, id_or_name: &str) -> Result<String> {
        if is_gene_id(id_or_name) {
            return Ok(id_or_name.to_string());
        }

        let mut gene_ids = self.trie.get(id_or_name);
        match gene_ids.len() {
            0 => Err(Error::NotFound { query: id_or_name.to_string() }),
            1 => Ok(gene_ids.remove(0).to_string()),
            _ => Err(Error::AmbiguousGeneQuery {
                query: id_or_name.to_string(),
                gene_ids: gene_ids.into_iter().map(String::from).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const SEARCH_TERMS: &str = r#"["ENSG00000012048", ["BRCA1", "RNF53", "BREAST CANCER 1"]]
["ENSG00000139618", ["BRCA2", "FANCD1"]]
["ENSG00000267595", ["BRCA1"]]
["ENSG00000169174", ["PCSK9", "NARC1"]]
"#;

    lazy_static! {
        static ref SEARCH: GeneSearch = GeneSearch::from_reader(Cursor::new(SEARCH_TERMS)).unwrap();
    }

    #[test]
    fn test_trie_exact_lookup_any_case() {
        let trie: PrefixTrie = vec![("Brca1", "G1"), ("BRCA1", "G2"), ("brca1", "G1")].into_iter().collect();
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get("brca1"), vec!["G1", "G2"]);
        assert_eq!(trie.get("BRCA"), Vec::<&str>::new());
        assert_eq!(trie.get("BRCA12"), Vec::<&str>::new());
    }

    #[test]
    fn test_trie_prefix_search_is_lexicographic() {
        let trie: PrefixTrie = vec![("BRCA2", "G2"), ("BRCA1", "G1"), ("BR", "G3"), ("PCSK9", "G4")]
            .into_iter().collect();
        let words: Vec<String> = trie.search("br").map(|m| m.word).collect();
        assert_eq!(words, vec!["BR", "BRCA1", "BRCA2"]);
        assert_eq!(trie.search("X").count(), 0);
    }

    #[test]
    fn test_trie_ambiguous_term() {
        let matches: Vec<SearchMatch> = SEARCH.trie().search("BRCA1").collect();
        assert_eq!(matches, vec![SearchMatch {
            word: "BRCA1".to_string(),
            docs: vec!["ENSG00000012048", "ENSG00000267595"],
        }]);
    }

    #[test]
    fn test_search_labels_ambiguous_genes() {
        let hits = SEARCH.search("brca");
        let labels: Vec<&str> = hits.iter().map(|hit| hit.label.as_str()).collect();
        assert_eq!(labels, vec![
            "BRCA1 (ENSG00000012048)",
            "BRCA1 (ENSG00000267595)",
            "BRCA2",
        ]);
        assert_eq!(hits[2].url, "/gene/ENSG00000139618");
    }

    #[test]
    fn test_search_is_capped() {
        let trie: PrefixTrie = (0..20).map(|i| (format!("GENE{:02}", i), format!("ENSG{:011}", i)))
            .collect::<Vec<_>>()
            .iter()
            .map(|(term, id)| (term.as_str(), id.as_str()))
            .collect();
        let search = GeneSearch::new(trie);
        assert_eq!(search.search("GENE").len(), MAX_SEARCH_RESULTS);
    }

    #[test]
    fn test_canonical_id_bypasses_trie() {
        let hits = SEARCH.search("ensg00000000001");
        assert_eq!(hits, vec![SearchHit {
            label: "ENSG00000000001".to_string(),
            url: "/gene/ENSG00000000001".to_string(),
        }]);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(SEARCH.resolve("pcsk9").unwrap(), "ENSG00000169174");
        assert_eq!(SEARCH.resolve("ENSG00000139618").unwrap(), "ENSG00000139618");
        match SEARCH.resolve("BRCA1") {
            Err(Error::AmbiguousGeneQuery { gene_ids, .. }) => assert_eq!(gene_ids.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        match SEARCH.resolve("BRC") {
            Err(Error::NotFound { query }) => assert_eq!(query, "BRC"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(SEARCH.resolve("ENSGR0000002").unwrap(), "ENSGR0000002");
        match SEARCH.resolve("ENSG1/../../tmp/secret") {
            Err(Error::NotFound { query }) => assert_eq!(query, "ENSG1/../../tmp/secret"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
