//! Severity ranking and grouping of functional consequence terms.

use std::collections::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use crate::ConsequenceCategory::{self, Lof, Missense, Synonymous, Other};

/// VEP terms from most to least severe.
const VEP_CONSEQUENCES: &[(&str, &str, ConsequenceCategory)] = &[
    ("transcript_ablation", "transcript ablation", Lof),
    ("splice_acceptor_variant", "splice acceptor", Lof),
    ("splice_donor_variant", "splice donor", Lof),
    ("stop_gained", "stop gained", Lof),
    ("frameshift_variant", "frameshift", Lof),
    ("stop_lost", "stop lost", Missense),
    ("start_lost", "start lost", Missense),
    ("initiator_codon_variant", "initiator codon", Missense),
    ("transcript_amplification", "transcript amplification", Missense),
    ("inframe_insertion", "inframe insertion", Missense),
    ("inframe_deletion", "inframe deletion", Missense),
    ("missense_variant", "missense", Missense),
    ("protein_altering_variant", "protein altering", Missense),
    ("splice_region_variant", "splice region", Other),
    ("incomplete_terminal_codon_variant", "incomplete terminal codon", Other),
    ("start_retained_variant", "start retained", Other),
    ("stop_retained_variant", "stop retained", Other),
    ("synonymous_variant", "synonymous", Synonymous),
    ("coding_sequence_variant", "coding sequence", Other),
    ("mature_miRNA_variant", "mature miRNA", Other),
    ("5_prime_UTR_variant", "5' UTR", Other),
    ("3_prime_UTR_variant", "3' UTR", Other),
    ("non_coding_transcript_exon_variant", "non coding transcript exon", Other),
    ("non_coding_exon_variant", "non coding exon", Other),
    ("intron_variant", "intron", Other),
    ("NMD_transcript_variant", "NMD transcript", Other),
    ("non_coding_transcript_variant", "non coding transcript", Other),
    ("nc_transcript_variant", "non coding transcript", Other),
    ("upstream_gene_variant", "upstream gene", Other),
    ("downstream_gene_variant", "downstream gene", Other),
    ("TFBS_ablation", "TFBS ablation", Other),
    ("TFBS_amplification", "TFBS amplification", Other),
    ("TF_binding_site_variant", "TF binding site", Other),
    ("regulatory_region_ablation", "regulatory region ablation", Other),
    ("regulatory_region_amplification", "regulatory region amplification", Other),
    ("feature_elongation", "feature elongation", Other),
    ("regulatory_region_variant", "regulatory region", Other),
    ("feature_truncation", "feature truncation", Other),
    ("intergenic_variant", "intergenic", Other),
];

lazy_static! {
    static ref VEP: ConsequenceClassifier = ConsequenceClassifier::vep();
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceDefinition {
    pub term: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<ConsequenceCategory>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Classification<'a> {
    pub category: ConsequenceCategory,
    pub label: &'a str,
}

/// Lookup table from consequence term to rank, category and label.
///
/// The rank of a term is its position in the definition list, so earlier
/// definitions are more severe. Terms not in the table share the
/// [`unknown_rank`](ConsequenceClassifier::unknown_rank), which is greater
/// than every known rank.
#[derive(Debug, Clone)]
pub struct ConsequenceClassifier {
    definitions: Vec<ConsequenceDefinition>,
    ranks: HashMap<String, usize>,
}

impl ConsequenceClassifier {
    pub fn new(definitions: Vec<ConsequenceDefinition>) -> ConsequenceClassifier {
        let mut ranks = HashMap::with_capacity(definitions.len());
        for (rank, definition) in definitions.iter().enumerate() {
            ranks.entry(definition.term.clone()).or_insert(rank);
        }
        ConsequenceClassifier { definitions, ranks }
    }

    pub fn vep() -> ConsequenceClassifier {
        let definitions = VEP_CONSEQUENCES.iter()
            .map(|&(term, label, category)| ConsequenceDefinition {
                term: term.to_string(),
                label: Some(label.to_string()),
                category: Some(category),
            })
            .collect();
        ConsequenceClassifier::new(definitions)
    }

    pub fn unknown_rank(&self) -> usize {
        self.definitions.len()
    }

    pub fn rank(&self, term: &str) -> usize {
        self.ranks.get(term).copied().unwrap_or_else(|| self.unknown_rank())
    }

    pub fn is_known(&self, term: &str) -> bool {
        self.ranks.contains_key(term)
    }

    /// Unknown terms are `other` and labelled with the term itself.
    pub fn classify<'a>(&'a self, term: &'a str) -> Classification<'a> {
        match self.ranks.get(term).map(|&rank| &self.definitions[rank]) {
            Some(definition) => Classification {
                category: definition.category.unwrap_or_default(),
                label: definition.label.as_deref().unwrap_or(term),
            },
            None => Classification { category: ConsequenceCategory::Other, label: term },
        }
    }

    /// Picks the lowest-ranked term; the first one wins a tie.
    pub fn most_severe<'t, S: AsRef<str>>(&self, terms: &'t [S]) -> Option<&'t str> {
        let mut best: Option<(usize, &str)> = None;
        for term in terms {
            let term = term.as_ref();
            let rank = self.rank(term);
            match best {
                Some((best_rank, _)) if best_rank <= rank => {}
                _ => best = Some((rank, term)),
            }
        }
        best.map(|(_, term)| term)
    }

    /// Buckets transcripts by their most severe term, then by gene, and
    /// orders the buckets from most to least severe.
    pub fn group_transcript_consequences(&self, transcripts: &[TranscriptConsequence]) -> Vec<ConsequenceGroup> {
        let mut buckets: IndexMap<&str, IndexMap<&str, ConsequenceGene>> = IndexMap::new();
        for transcript in transcripts {
            let term = match self.most_severe(transcript.consequence_terms.as_slice()) {
                Some(term) => term,
                None => {
                    tracing::trace!("transcript {} has no consequence terms", transcript.transcript_id);
                    continue;
                }
            };
            buckets.entry(term)
                .or_insert_with(IndexMap::new)
                .entry(transcript.gene_id.as_str())
                .or_insert_with(|| ConsequenceGene {
                    gene_id: transcript.gene_id.clone(),
                    gene_symbol: transcript.gene_symbol.clone(),
                    transcripts: Vec::new(),
                })
                .transcripts.push(transcript.clone());
        }

        let mut groups: Vec<ConsequenceGroup> = buckets.into_iter()
            .map(|(term, genes)| {
                let classification = self.classify(term);
                ConsequenceGroup {
                    consequence: term.to_string(),
                    label: classification.label.to_string(),
                    category: classification.category,
                    rank: self.rank(term),
                    genes: genes.into_iter().map(|(_, gene)| gene).collect(),
                }
            })
            .collect();
        groups.sort_by_key(|group| group.rank);
        groups
    }
}

impl Default for ConsequenceClassifier {
    fn default() -> Self {
        ConsequenceClassifier::vep()
    }
}

/// [`ConsequenceClassifier::most_severe`] over the VEP table.
pub fn most_severe<S: AsRef<str>>(terms: &[S]) -> Option<&str> {
    VEP.most_severe(terms)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptConsequence {
    pub gene_id: String,
    #[serde(default)]
    pub gene_symbol: Option<String>,
    pub transcript_id: String,
    pub consequence_terms: Vec<String>,
    #[serde(default)]
    pub hgvsc: Option<String>,
    #[serde(default)]
    pub hgvsp: Option<String>,
    #[serde(default)]
    pub is_canonical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsequenceGene {
    pub gene_id: String,
    pub gene_symbol: Option<String>,
    pub transcripts: Vec<TranscriptConsequence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsequenceGroup {
    pub consequence: String,
    pub label: String,
    pub category: ConsequenceCategory,
    #[serde(skip)]
    rank: usize,
    pub genes: Vec<ConsequenceGene>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn transcript(gene: &str, id: &str, terms: &[&str]) -> TranscriptConsequence {
        TranscriptConsequence {
            gene_id: gene.to_string(),
            gene_symbol: None,
            transcript_id: id.to_string(),
            consequence_terms: terms.iter().map(|t| t.to_string()).collect(),
            hgvsc: None,
            hgvsp: None,
            is_canonical: false,
        }
    }

    #[test]
    fn test_most_severe_prefers_lof() {
        assert_eq!(most_severe(&["synonymous_variant", "stop_gained"]), Some("stop_gained"));
        assert_eq!(most_severe::<&str>(&[]), None);
    }

    #[test]
    fn test_most_severe_tie_keeps_first() {
        assert_eq!(most_severe(&["made_up", "also_made_up"]), Some("made_up"));
    }

    #[rstest]
    #[case("stop_gained", ConsequenceCategory::Lof, "stop gained")]
    #[case("missense_variant", ConsequenceCategory::Missense, "missense")]
    #[case("synonymous_variant", ConsequenceCategory::Synonymous, "synonymous")]
    #[case("intron_variant", ConsequenceCategory::Other, "intron")]
    #[case("not_a_term", ConsequenceCategory::Other, "not_a_term")]
    fn test_classify(#[case] term: &str, #[case] category: ConsequenceCategory, #[case] label: &str) {
        let classifier = ConsequenceClassifier::vep();
        assert_eq!(classifier.classify(term), Classification { category, label });
    }

    #[test]
    fn test_unknown_rank_is_last() {
        let classifier = ConsequenceClassifier::vep();
        assert!(classifier.rank("intergenic_variant") < classifier.unknown_rank());
        assert_eq!(classifier.rank("whatever"), classifier.unknown_rank());
        assert!(classifier.rank("frameshift_variant") < classifier.rank("missense_variant"));
    }

    #[test]
    fn test_dataset_definitions() {
        let classifier = ConsequenceClassifier::new(vec![
            ConsequenceDefinition { term: "lof".into(), label: Some("loss of function".into()), category: Some(Lof) },
            ConsequenceDefinition { term: "mis".into(), label: None, category: Some(Missense) },
            ConsequenceDefinition { term: "splice".into(), label: Some("splice region".into()), category: None },
        ]);
        assert_eq!(classifier.classify("lof").label, "loss of function");
        assert_eq!(classifier.classify("mis").label, "mis");
        assert_eq!(classifier.classify("splice").category, ConsequenceCategory::Other);
        assert_eq!(classifier.most_severe(&["splice", "mis"]), Some("mis"));
    }

    #[test]
    fn test_group_transcript_consequences() {
        let classifier = ConsequenceClassifier::vep();
        let transcripts = vec![
            transcript("ENSG1", "ENST1", &["intron_variant"]),
            transcript("ENSG1", "ENST2", &["synonymous_variant", "stop_gained"]),
            transcript("ENSG2", "ENST3", &["weird_term"]),
            transcript("ENSG2", "ENST4", &["stop_gained"]),
            transcript("ENSG1", "ENST5", &["stop_gained"]),
            transcript("ENSG3", "ENST6", &[]),
        ];
        let groups = classifier.group_transcript_consequences(&transcripts);

        let summary: Vec<(&str, Vec<(&str, usize)>)> = groups.iter()
            .map(|group| {
                let genes = group.genes.iter()
                    .map(|gene| (gene.gene_id.as_str(), gene.transcripts.len()))
                    .collect();
                (group.consequence.as_str(), genes)
            })
            .collect();
        assert_eq!(summary, vec![
            ("stop_gained", vec![("ENSG1", 2), ("ENSG2", 1)]),
            ("intron_variant", vec![("ENSG1", 1)]),
            ("weird_term", vec![("ENSG2", 1)]),
        ]);
        assert_eq!(groups[0].category, ConsequenceCategory::Lof);
        assert_eq!(groups[2].label, "weird_term");
    }
}
