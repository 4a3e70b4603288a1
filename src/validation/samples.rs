//! Sample program texts by project archetype.

use super::{Expectation, LimitCheck, Sample};
use crate::coverage::CoverageType::*;
use crate::limits::LimitName::*;
use crate::requirement::PatternKind;

/// Every built-in sample.
pub fn all() -> Vec<Sample> {
    vec![
        HIGH_RISE_RESIDENTIAL,
        HOSPITAL_RENOVATION,
        SCHOOL_CAMPUS,
        DISTRIBUTION_WAREHOUSE,
        MIXED_USE_RETAIL,
        HEAVY_CIVIL,
        TENANT_IMPROVEMENT,
        PROSE_ONLY,
        FIGURES_WITHOUT_COVERAGE,
    ]
}

pub const HIGH_RISE_RESIDENTIAL: Sample = Sample {
    name: "high-rise residential",
    text: "Riverside Residential Tower - Subcontractor Insurance Schedule
Trade | GL | Auto | Umbrella
Concrete | $2,000,000 | $1,000,000 | $10,000,000
Electrical | $1,000,000 | $1,000,000 | $5,000,000
Curtain Wall | $1,000,000 | $1,000,000 | $5,000,000
All subcontractors shall name the Owner and Developer as additional insured.",
    expect: Expectation {
        pattern: PatternKind::TierTradeTable,
        rows: 9,
        requires_review: false,
        additional_insured: Some(true),
        limits: &[
            LimitCheck {
                trade_or_tier: "Concrete",
                coverage: GeneralLiability,
                limit: EachOccurrence,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "Electrical",
                coverage: AutomobileLiability,
                limit: CombinedSingleLimit,
                amount: 1_000_000,
            },
            LimitCheck {
                trade_or_tier: "Curtain Wall",
                coverage: Umbrella,
                limit: EachOccurrence,
                amount: 5_000_000,
            },
        ],
    },
};

pub const HOSPITAL_RENOVATION: Sample = Sample {
    name: "hospital renovation",
    text: "St. Mary's Hospital East Wing Renovation
Tier 1 - Major Trades
General Liability: $2,000,000 | $4,000,000
Automobile Liability: $1,000,000
Umbrella: $10,000,000
Tier 2 - Minor Trades
General Liability: $1,000,000 | $2,000,000
Automobile Liability: $1,000,000
Professional Liability (claims-made): $1,000,000 | $2,000,000
Waiver of subrogation required in favor of the Hospital.",
    expect: Expectation {
        pattern: PatternKind::TierTradeTable,
        rows: 6,
        requires_review: false,
        additional_insured: None,
        limits: &[
            LimitCheck {
                trade_or_tier: "Major Trades",
                coverage: GeneralLiability,
                limit: GeneralAggregate,
                amount: 4_000_000,
            },
            LimitCheck {
                trade_or_tier: "Major Trades",
                coverage: Umbrella,
                limit: EachOccurrence,
                amount: 10_000_000,
            },
            LimitCheck {
                trade_or_tier: "Minor Trades",
                coverage: ProfessionalLiability,
                limit: EachClaim,
                amount: 1_000_000,
            },
        ],
    },
};

pub const SCHOOL_CAMPUS: Sample = Sample {
    name: "school campus",
    text: "Lincoln Unified School District - Campus Modernization
Coverage | Tier 1 | Tier 2 | Tier 3
General Liability Each Occurrence | $1,000,000 | $2,000,000 | $5,000,000
General Aggregate | $2,000,000 | $4,000,000 | $10,000,000
Umbrella | $5,000,000 | $10,000,000 | $25,000,000",
    expect: Expectation {
        pattern: PatternKind::TierTradeTable,
        rows: 6,
        requires_review: false,
        additional_insured: None,
        limits: &[
            LimitCheck {
                trade_or_tier: "Tier 2",
                coverage: GeneralLiability,
                limit: EachOccurrence,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "Tier 2",
                coverage: GeneralLiability,
                limit: GeneralAggregate,
                amount: 4_000_000,
            },
            LimitCheck {
                trade_or_tier: "Tier 3",
                coverage: Umbrella,
                limit: EachOccurrence,
                amount: 25_000_000,
            },
        ],
    },
};

pub const DISTRIBUTION_WAREHOUSE: Sample = Sample {
    name: "distribution warehouse",
    text: "Distribution Warehouse - Building C
Prime Subcontractor: Apex Steel Erectors
General Liability
Each Occurrence: $2,000,000
General Aggregate: $4,000,000
Automobile Liability
Combined Single Limit: $1,000,000
Subcontractor: Northline Electric
Each Occurrence: $1,000,000
General Aggregate: $2,000,000
Workers' Compensation
Each Accident: $1,000,000",
    expect: Expectation {
        pattern: PatternKind::PrimeSubcontractor,
        rows: 4,
        requires_review: false,
        additional_insured: None,
        limits: &[
            LimitCheck {
                trade_or_tier: "Apex Steel Erectors",
                coverage: GeneralLiability,
                limit: EachOccurrence,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "Apex Steel Erectors",
                coverage: AutomobileLiability,
                limit: CombinedSingleLimit,
                amount: 1_000_000,
            },
            LimitCheck {
                trade_or_tier: "Northline Electric",
                coverage: GeneralLiability,
                limit: GeneralAggregate,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "Northline Electric",
                coverage: WorkersCompensation,
                limit: EachAccident,
                amount: 1_000_000,
            },
        ],
    },
};

pub const MIXED_USE_RETAIL: Sample = Sample {
    name: "mixed-use retail",
    text: "Harbor Point Mixed-Use Retail Center
Minimum insurance for all contractors working on site:
Commercial General Liability: $1,000,000 each occurrence / $2,000,000 general aggregate
Automobile Liability: $1,000,000 combined single limit
Umbrella: $5,000,000
Workers' Compensation: Statutory | Employers Liability $1,000,000
Certificate holder must be named as additional insured with waiver of subrogation.",
    expect: Expectation {
        pattern: PatternKind::GeneralFormat,
        rows: 4,
        requires_review: false,
        additional_insured: Some(true),
        limits: &[
            LimitCheck {
                trade_or_tier: "All Trades",
                coverage: GeneralLiability,
                limit: GeneralAggregate,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "All Trades",
                coverage: AutomobileLiability,
                limit: CombinedSingleLimit,
                amount: 1_000_000,
            },
            LimitCheck {
                trade_or_tier: "All Trades",
                coverage: WorkersCompensation,
                limit: EachAccident,
                amount: 1_000_000,
            },
        ],
    },
};

pub const HEAVY_CIVIL: Sample = Sample {
    name: "heavy civil",
    text: "Interstate 80 Bridge Replacement - Contract 12
Tier 1 - Prime Contractor: GL $5M | $10M Auto $2M Umbrella $25M
Tier 2 - Earthwork: GL $2M | $4M Auto $1M Umbrella $10M Pollution $2M
Tier 3 - Trucking: GL $1M | $2M Auto $1M
Contractor's Pollution Liability is required for all earthwork.",
    expect: Expectation {
        pattern: PatternKind::TierTradeTable,
        rows: 9,
        requires_review: false,
        additional_insured: None,
        limits: &[
            LimitCheck {
                trade_or_tier: "Prime Contractor",
                coverage: Umbrella,
                limit: EachOccurrence,
                amount: 25_000_000,
            },
            LimitCheck {
                trade_or_tier: "Earthwork",
                coverage: PollutionLiability,
                limit: EachOccurrence,
                amount: 2_000_000,
            },
            LimitCheck {
                trade_or_tier: "Trucking",
                coverage: GeneralLiability,
                limit: GeneralAggregate,
                amount: 2_000_000,
            },
        ],
    },
};

pub const TENANT_IMPROVEMENT: Sample = Sample {
    name: "tenant improvement (in thousands)",
    text: "Office Tenant Improvement - Limits shown in thousands
Trade | GL | Auto
Drywall | $1,000 | $1,000
Painting | $1,000 | $500",
    expect: Expectation {
        pattern: PatternKind::TierTradeTable,
        rows: 4,
        requires_review: true,
        additional_insured: None,
        limits: &[
            LimitCheck {
                trade_or_tier: "Drywall",
                coverage: GeneralLiability,
                limit: EachOccurrence,
                amount: 1_000_000,
            },
            LimitCheck {
                trade_or_tier: "Painting",
                coverage: AutomobileLiability,
                limit: CombinedSingleLimit,
                amount: 500_000,
            },
        ],
    },
};

pub const PROSE_ONLY: Sample = Sample {
    name: "prose only",
    text: "Subcontractor shall procure and maintain insurance of the types and in the amounts acceptable to the Owner. \
Certificates must be delivered before mobilization.",
    expect: Expectation {
        pattern: PatternKind::Unmatched,
        rows: 0,
        requires_review: true,
        additional_insured: None,
        limits: &[],
    },
};

pub const FIGURES_WITHOUT_COVERAGE: Sample = Sample {
    name: "figures without coverage",
    text: "Contract sum: $4,250,000
Liquidated damages of $2,500 per calendar day.",
    expect: Expectation {
        pattern: PatternKind::Unmatched,
        rows: 0,
        requires_review: true,
        additional_insured: None,
        limits: &[],
    },
};
