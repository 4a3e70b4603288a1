//! Named limits and the limit-ordering schedule.
//!
//! The schedule answers two questions for every coverage type:
//!
//! 1. Given `n` positional amounts, which named limit does each one fill?
//!    Each coverage lists its accepted *layouts*, one per supported arity.
//!    A row whose amount count matches no layout is ambiguous.
//! 2. Which named limits must not exceed which others? (`eachOccurrence <=
//!    generalAggregate` and similar.) A violated rule means the figures were
//!    probably read in the wrong order.
//!
//! The built-in default encodes the conventional ACORD-style ordering. It can
//! be replaced at runtime from JSON so the table can be tuned against real
//! program documents without a rebuild.

use crate::coverage::CoverageType;
use crate::currency::Dollars;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;

/// A named limit slot within a coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitName {
    /// Each occurrence
    EachOccurrence,
    /// General aggregate (GL)
    GeneralAggregate,
    /// Products / completed operations aggregate (GL)
    ProductsCompletedOperationsAggregate,
    /// Personal and advertising injury (GL)
    PersonalAndAdvertisingInjury,
    /// Combined single limit (auto)
    CombinedSingleLimit,
    /// Bodily injury per person (auto, split limits)
    BodilyInjuryPerPerson,
    /// Bodily injury per accident (auto, split limits)
    BodilyInjuryPerAccident,
    /// Property damage (auto, split limits)
    PropertyDamage,
    /// Employers' liability each accident
    EachAccident,
    /// Employers' liability disease, each employee
    DiseaseEachEmployee,
    /// Employers' liability disease, policy limit
    DiseasePolicyLimit,
    /// Each claim (claims-made lines)
    EachClaim,
    /// Aggregate (non-GL lines)
    Aggregate,
    /// Unnamed single limit
    Limit,
}

impl LimitName {
    /// Coverage a label unambiguously belongs to, if any.
    pub fn implied_coverage(self) -> Option<CoverageType> {
        match self {
            LimitName::GeneralAggregate
            | LimitName::ProductsCompletedOperationsAggregate
            | LimitName::PersonalAndAdvertisingInjury => Some(CoverageType::GeneralLiability),
            LimitName::CombinedSingleLimit
            | LimitName::BodilyInjuryPerPerson
            | LimitName::BodilyInjuryPerAccident
            | LimitName::PropertyDamage => Some(CoverageType::AutomobileLiability),
            LimitName::DiseaseEachEmployee | LimitName::DiseasePolicyLimit => {
                Some(CoverageType::WorkersCompensation)
            },
            _ => None,
        }
    }

    /// Translate a generic label into the slot name the coverage uses.
    ///
    /// "Aggregate" under GL is the general aggregate, "Each Accident" under
    /// auto is the combined single limit, and so on.
    pub fn resolve_for(self, coverage: CoverageType) -> LimitName {
        use CoverageType as C;
        use LimitName as L;
        match (self, coverage) {
            (L::Aggregate, C::GeneralLiability) => L::GeneralAggregate,
            (L::GeneralAggregate, c) if c != C::GeneralLiability => L::Aggregate,
            (L::EachAccident, C::AutomobileLiability) => L::CombinedSingleLimit,
            (L::EachClaim, C::PollutionLiability) => L::EachOccurrence,
            (L::EachOccurrence, C::ProfessionalLiability) => L::EachClaim,
            _ => self,
        }
    }
}

const LIMIT_LABELS: &[(&str, LimitName, &str)] = &[
    (
        "pcoa",
        LimitName::ProductsCompletedOperationsAggregate,
        r"\b(?i:products?\s*[-/&]?\s*(?:and\s+)?completed\s+op(?:eration)?s?\.?(?:\s+agg(?:regate)?\.?)?|prod\.?\s*[-/]\s*comp(?:leted)?\.?\s*ops?\.?(?:\s+agg(?:regate)?\.?)?)",
    ),
    (
        "pai",
        LimitName::PersonalAndAdvertisingInjury,
        r"\b(?i:personal\s*(?:&|and)\s*adv(?:ertising)?\.?\s+injury)",
    ),
    (
        "genagg",
        LimitName::GeneralAggregate,
        r"\b(?i:gen(?:eral)?\.?\s+agg(?:regate)?\.?)",
    ),
    (
        "csl",
        LimitName::CombinedSingleLimit,
        r"\b(?i:combined\s+single\s+limit)|\bCSL\b",
    ),
    (
        "bipp",
        LimitName::BodilyInjuryPerPerson,
        r"\b(?i:bodily\s+injury\s*[-(]?\s*(?:per|each)\s+person\)?)",
    ),
    (
        "bipa",
        LimitName::BodilyInjuryPerAccident,
        r"\b(?i:bodily\s+injury\s*[-(]?\s*(?:per|each)\s+accident\)?)",
    ),
    ("pd", LimitName::PropertyDamage, r"\b(?i:property\s+damage)"),
    (
        "dee",
        LimitName::DiseaseEachEmployee,
        r"\b(?i:(?:e\.?l\.?\s+)?disease\s*-?\s*(?:each|per)\s+employee)",
    ),
    (
        "dpl",
        LimitName::DiseasePolicyLimit,
        r"\b(?i:(?:e\.?l\.?\s+)?disease\s*-?\s*policy\s+limit)",
    ),
    (
        "eacc",
        LimitName::EachAccident,
        r"\b(?i:(?:e\.?l\.?\s+)?each\s+accident|per\s+accident)",
    ),
    (
        "eocc",
        LimitName::EachOccurrence,
        r"\b(?i:each\s+occurrence|per\s+occurrence|each\s+occ\.?)",
    ),
    ("eclaim", LimitName::EachClaim, r"\b(?i:each\s+claim|per\s+claim)"),
    ("agg", LimitName::Aggregate, r"\b(?i:annual\s+aggregate|aggregate|agg\.)"),
];

lazy_static! {
    static ref RE_LIMIT_LABEL: Regex = {
        let pattern = LIMIT_LABELS
            .iter()
            .map(|(group, _, alternatives)| format!("(?P<{}>{})", group, alternatives))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&pattern).unwrap()
    };
}

/// A limit label found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitMention {
    /// Slot the label names (not yet resolved against a coverage)
    pub name: LimitName,
    /// Byte range of the label
    pub range: Range<usize>,
}

/// Find limit labels in a line, left to right.
pub fn find_limit_labels(line: &str) -> Vec<LimitMention> {
    RE_LIMIT_LABEL
        .captures_iter(line)
        .filter_map(|caps| {
            LIMIT_LABELS.iter().find_map(|(group, name, _)| {
                caps.name(group).map(|m| LimitMention {
                    name: *name,
                    range: m.range(),
                })
            })
        })
        .collect()
}

/// Whether the text contains any limit label.
pub fn contains_limit_label(text: &str) -> bool {
    RE_LIMIT_LABEL.is_match(text)
}

/// A `lesser <= greater` constraint between two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingRule {
    /// Slot that must not exceed `greater`
    pub lesser: LimitName,
    /// Slot that must be at least `lesser`
    pub greater: LimitName,
}

impl OrderingRule {
    const fn new(lesser: LimitName, greater: LimitName) -> Self {
        Self { lesser, greater }
    }
}

/// Layouts and ordering rules for one coverage type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSchedule {
    /// Accepted positional layouts, one per arity
    pub layouts: Vec<Vec<LimitName>>,
    /// Magnitude constraints between slots
    #[serde(default)]
    pub ordering: Vec<OrderingRule>,
}

/// Result of assigning positional amounts to named slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    /// Amounts tied to a named slot
    pub limits: BTreeMap<LimitName, Dollars>,
    /// Amounts left over after the fullest layout was exhausted
    pub unassigned: Vec<Dollars>,
    /// True when the amount count matched a known layout exactly
    pub exact: bool,
}

/// The per-coverage limit-ordering table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LimitSchedule {
    coverages: BTreeMap<CoverageType, CoverageSchedule>,
}

impl Default for LimitSchedule {
    fn default() -> Self {
        use LimitName::*;

        let mut coverages = BTreeMap::new();
        coverages.insert(
            CoverageType::GeneralLiability,
            CoverageSchedule {
                layouts: vec![
                    vec![EachOccurrence],
                    vec![EachOccurrence, GeneralAggregate],
                    vec![EachOccurrence, GeneralAggregate, ProductsCompletedOperationsAggregate],
                    vec![
                        EachOccurrence,
                        GeneralAggregate,
                        ProductsCompletedOperationsAggregate,
                        PersonalAndAdvertisingInjury,
                    ],
                ],
                ordering: vec![
                    OrderingRule::new(EachOccurrence, GeneralAggregate),
                    OrderingRule::new(EachOccurrence, ProductsCompletedOperationsAggregate),
                ],
            },
        );
        coverages.insert(
            CoverageType::AutomobileLiability,
            CoverageSchedule {
                layouts: vec![
                    vec![CombinedSingleLimit],
                    vec![BodilyInjuryPerPerson, BodilyInjuryPerAccident, PropertyDamage],
                ],
                ordering: vec![OrderingRule::new(BodilyInjuryPerPerson, BodilyInjuryPerAccident)],
            },
        );
        coverages.insert(
            CoverageType::WorkersCompensation,
            CoverageSchedule {
                layouts: vec![
                    vec![EachAccident],
                    vec![EachAccident, DiseaseEachEmployee, DiseasePolicyLimit],
                ],
                ordering: vec![OrderingRule::new(DiseaseEachEmployee, DiseasePolicyLimit)],
            },
        );
        coverages.insert(
            CoverageType::Umbrella,
            CoverageSchedule {
                layouts: vec![vec![EachOccurrence], vec![EachOccurrence, Aggregate]],
                ordering: vec![OrderingRule::new(EachOccurrence, Aggregate)],
            },
        );
        coverages.insert(
            CoverageType::ProfessionalLiability,
            CoverageSchedule {
                layouts: vec![vec![EachClaim], vec![EachClaim, Aggregate]],
                ordering: vec![OrderingRule::new(EachClaim, Aggregate)],
            },
        );
        coverages.insert(
            CoverageType::PollutionLiability,
            CoverageSchedule {
                layouts: vec![vec![EachOccurrence], vec![EachOccurrence, Aggregate]],
                ordering: vec![OrderingRule::new(EachOccurrence, Aggregate)],
            },
        );
        coverages.insert(
            CoverageType::Other,
            CoverageSchedule {
                layouts: vec![vec![Limit]],
                ordering: Vec::new(),
            },
        );

        Self { coverages }
    }
}

impl LimitSchedule {
    /// Parse and validate a schedule from JSON.
    ///
    /// The JSON is an object keyed by coverage type (`"generalLiability"`,
    /// ...). Coverage types missing from the file keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: BTreeMap<CoverageType, CoverageSchedule> = serde_json::from_str(json)?;
        let mut schedule = Self::default();
        schedule.coverages.extend(overrides);
        schedule.validate()?;
        Ok(schedule)
    }

    /// Load a schedule from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize the full schedule.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the schedule for structural mistakes.
    ///
    /// Every coverage needs at least one layout; layouts must be non-empty,
    /// free of repeated slots, and have distinct arities.
    pub fn validate(&self) -> Result<()> {
        for (coverage, entry) in &self.coverages {
            if entry.layouts.is_empty() {
                return Err(Error::InvalidSchedule(format!("{} has no layouts", coverage)));
            }

            let mut arities = BTreeSet::new();
            for layout in &entry.layouts {
                if layout.is_empty() {
                    return Err(Error::InvalidSchedule(format!("{} has an empty layout", coverage)));
                }
                let unique: BTreeSet<_> = layout.iter().collect();
                if unique.len() != layout.len() {
                    return Err(Error::InvalidSchedule(format!(
                        "{} layout {:?} repeats a slot",
                        coverage, layout
                    )));
                }
                if !arities.insert(layout.len()) {
                    return Err(Error::InvalidSchedule(format!(
                        "{} has two layouts of arity {}",
                        coverage,
                        layout.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Schedule entry for a coverage type.
    pub fn get(&self, coverage: CoverageType) -> Option<&CoverageSchedule> {
        self.coverages.get(&coverage)
    }

    /// Layout whose arity equals `arity`.
    pub fn layout_for(&self, coverage: CoverageType, arity: usize) -> Option<&[LimitName]> {
        self.get(coverage)?
            .layouts
            .iter()
            .find(|layout| layout.len() == arity)
            .map(Vec::as_slice)
    }

    /// Longest layout for a coverage.
    pub fn fullest_layout(&self, coverage: CoverageType) -> &[LimitName] {
        self.get(coverage)
            .and_then(|entry| entry.layouts.iter().max_by_key(|layout| layout.len()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any layout of the coverage contains the slot.
    pub fn accepts(&self, coverage: CoverageType, name: LimitName) -> bool {
        self.get(coverage)
            .map(|entry| entry.layouts.iter().any(|layout| layout.contains(&name)))
            .unwrap_or(false)
    }

    /// Assign positional amounts to slots.
    ///
    /// An exact arity match fills the matching layout. Otherwise the amounts
    /// are laid over the fullest layout in order and whatever does not fit
    /// is returned as unassigned; the caller must treat that result as a
    /// guess.
    pub fn assign(&self, coverage: CoverageType, amounts: &[Dollars]) -> Assignment {
        if let Some(layout) = self.layout_for(coverage, amounts.len()) {
            return Assignment {
                limits: layout.iter().copied().zip(amounts.iter().copied()).collect(),
                unassigned: Vec::new(),
                exact: true,
            };
        }

        let fullest = self.fullest_layout(coverage);
        let take = fullest.len().min(amounts.len());
        Assignment {
            limits: fullest[..take].iter().copied().zip(amounts[..take].iter().copied()).collect(),
            unassigned: amounts[take..].to_vec(),
            exact: false,
        }
    }

    /// Ordering rules broken by a set of limits.
    pub fn ordering_violations(
        &self,
        coverage: CoverageType,
        limits: &BTreeMap<LimitName, Dollars>,
    ) -> Vec<OrderingRule> {
        let Some(entry) = self.get(coverage) else {
            return Vec::new();
        };
        entry
            .ordering
            .iter()
            .filter(|rule| match (limits.get(&rule.lesser), limits.get(&rule.greater)) {
                (Some(lesser), Some(greater)) => lesser > greater,
                _ => false,
            })
            .copied()
            .collect()
    }
}
