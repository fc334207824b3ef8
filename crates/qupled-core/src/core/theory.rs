use phf::{Set, phf_set};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static STLS_THEORIES: Set<&'static str> = phf_set! {
    "STLS",
};

static STLS_IET_THEORIES: Set<&'static str> = phf_set! {
    "STLS-HNC", "STLS-IOI", "STLS-LCT",
};

static QSTLS_THEORIES: Set<&'static str> = phf_set! {
    "QSTLS",
};

static QSTLS_IET_THEORIES: Set<&'static str> = phf_set! {
    "QSTLS-HNC", "QSTLS-IOI", "QSTLS-LCT",
};

/// The four solver variants handled by the orchestrator.
///
/// Each variant accepts a fixed set of theory identifiers and persists the base
/// table set plus its own extra tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeKind {
    /// Classical STLS.
    Stls,
    /// Classical STLS with a bridge-function adder (HNC, IOI or LCT closure).
    StlsIet,
    /// Quantum STLS.
    Qstls,
    /// Quantum STLS with a bridge-function adder.
    QstlsIet,
}

/// Tables written for every variant, in persistence order.
pub const BASE_TABLES: [TableKey; 7] = [
    TableKey::Inputs,
    TableKey::Idr,
    TableKey::Sdr,
    TableKey::Slfc,
    TableKey::Ssf,
    TableKey::SsfHf,
    TableKey::Wvg,
];

/// Tables a live scheme can render, before the variant-specific extras.
const BASE_PLOTS: [TableKey; 6] = [
    TableKey::Idr,
    TableKey::Rdf,
    TableKey::Sdr,
    TableKey::Slfc,
    TableKey::Ssf,
    TableKey::SsfHf,
];

impl SchemeKind {
    pub const ALL: [SchemeKind; 4] = [
        SchemeKind::Stls,
        SchemeKind::StlsIet,
        SchemeKind::Qstls,
        SchemeKind::QstlsIet,
    ];

    pub fn allowed_theories(self) -> &'static Set<&'static str> {
        match self {
            SchemeKind::Stls => &STLS_THEORIES,
            SchemeKind::StlsIet => &STLS_IET_THEORIES,
            SchemeKind::Qstls => &QSTLS_THEORIES,
            SchemeKind::QstlsIet => &QSTLS_IET_THEORIES,
        }
    }

    pub fn allows(self, theory: &str) -> bool {
        self.allowed_theories().contains(theory)
    }

    /// The theory a variant runs when the caller does not name one.
    ///
    /// The IET variants have no default: the closure must be chosen explicitly.
    pub fn default_theory(self) -> Option<&'static str> {
        match self {
            SchemeKind::Stls => Some("STLS"),
            SchemeKind::Qstls => Some("QSTLS"),
            SchemeKind::StlsIet | SchemeKind::QstlsIet => None,
        }
    }

    /// Finds the variant whose allowed set contains `theory`.
    pub fn for_theory(theory: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.allows(theory))
    }

    pub fn is_quantum(self) -> bool {
        matches!(self, SchemeKind::Qstls | SchemeKind::QstlsIet)
    }

    pub fn has_bridge_function(self) -> bool {
        matches!(self, SchemeKind::StlsIet | SchemeKind::QstlsIet)
    }

    /// Whether the theory is checked when the scheme is built rather than only when
    /// it is computed.
    pub fn validates_on_construction(self) -> bool {
        !matches!(self, SchemeKind::Stls)
    }

    /// Tables this variant adds on top of [`BASE_TABLES`].
    pub fn extra_tables(self) -> &'static [TableKey] {
        match self {
            SchemeKind::Stls => &[],
            SchemeKind::StlsIet => &[TableKey::Bf],
            SchemeKind::Qstls => &[TableKey::Adr],
            SchemeKind::QstlsIet => &[TableKey::Adr, TableKey::Bf],
        }
    }

    /// Every table written by a successful compute, in persistence order.
    pub fn persisted_tables(self) -> impl Iterator<Item = TableKey> {
        BASE_TABLES
            .into_iter()
            .chain(self.extra_tables().iter().copied())
    }

    /// Every table a live scheme of this variant can render, in rendering order.
    pub fn plottable_tables(self) -> impl Iterator<Item = TableKey> {
        BASE_PLOTS
            .into_iter()
            .chain(self.extra_tables().iter().copied())
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemeKind::Stls => "STLS",
            SchemeKind::StlsIet => "STLS-IET",
            SchemeKind::Qstls => "QSTLS",
            SchemeKind::QstlsIet => "QSTLS-IET",
        };
        write!(f, "{}", name)
    }
}

/// Named sections of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKey {
    Inputs,
    Adr,
    Bf,
    Idr,
    Rdf,
    RdfGrid,
    Sdr,
    Slfc,
    Ssf,
    SsfHf,
    Wvg,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown result table: {0}")]
pub struct UnknownTableError(pub String);

impl TableKey {
    pub const ALL: [TableKey; 11] = [
        TableKey::Inputs,
        TableKey::Adr,
        TableKey::Bf,
        TableKey::Idr,
        TableKey::Rdf,
        TableKey::RdfGrid,
        TableKey::Sdr,
        TableKey::Slfc,
        TableKey::Ssf,
        TableKey::SsfHf,
        TableKey::Wvg,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKey::Inputs => "inputs",
            TableKey::Adr => "adr",
            TableKey::Bf => "bf",
            TableKey::Idr => "idr",
            TableKey::Rdf => "rdf",
            TableKey::RdfGrid => "rdfGrid",
            TableKey::Sdr => "sdr",
            TableKey::Slfc => "slfc",
            TableKey::Ssf => "ssf",
            TableKey::SsfHf => "ssfHF",
            TableKey::Wvg => "wvg",
        }
    }

    /// Y-axis label used when the table is rendered; `None` for tables that are only
    /// ever used as abscissae or metadata.
    pub fn label(self) -> Option<&'static str> {
        match self {
            TableKey::Adr => Some("Auxiliary density response"),
            TableKey::Bf => Some("Bridge function adder"),
            TableKey::Idr => Some("Ideal density response"),
            TableKey::Rdf => Some("Radial distribution function"),
            TableKey::Sdr => Some("Static density response"),
            TableKey::Slfc => Some("Static local field correction"),
            TableKey::Ssf => Some("Static structure factor"),
            TableKey::SsfHf => Some("Hartree-Fock static structure factor"),
            TableKey::Inputs | TableKey::RdfGrid | TableKey::Wvg => None,
        }
    }

    /// Tables tabulated over wave vector and Matsubara index.
    pub fn is_matsubara_table(self) -> bool {
        matches!(self, TableKey::Idr | TableKey::Adr)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKey {
    type Err = UnknownTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TableKey::ALL
            .into_iter()
            .find(|key| key.name() == trimmed)
            .ok_or_else(|| UnknownTableError(trimmed.to_string()))
    }
}
