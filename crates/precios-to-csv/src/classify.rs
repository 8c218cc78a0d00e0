//! Column roles and the generic/commercial split of pharmacy surveys.
//!
//! Survey tables mix identity columns (what is being priced), vendor columns
//! (one price per seller) and summary statistics computed by the publisher.
//! Roles are decided from the composite header text, page by page.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::family::{Channel, ReportFamily};
use crate::grid::PageGrid;

static RETAIL_EXCLUDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)casa editorial|\b(?:n[0oº°]|no)\b|\borden|resumen general media y/o|promedio global|\bprecios\b|\bm[íi]nimo|\bm[áa]ximo|\bmoda\b|\bmediana|\bdesviaci[óo]n|\best[áa]ndar",
    )
    .expect("hardcoded retail exclusion regex is valid")
});

static PHARMACY_EXCLUDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:n[0oº°]|no)\b|\b(?:orden|resumen|general|media|promedio|global|m[íi]nimo|m[áa]ximo|moda|mediana|desviaci[óo]n|est[áa]ndar)",
    )
    .expect("hardcoded pharmacy exclusion regex is valid")
});

static RETAIL_IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)producto|descripci[óo]n|art[íi]culo|unidad|presentaci[óo]n|medida|empaque")
        .expect("hardcoded retail identity regex is valid")
});

static PHARMACY_IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)medicamento|nombre|laboratorio|fabricante|presentaci[óo]n|unidad|forma\b|dosis|\bv[íi]a\b",
    )
    .expect("hardcoded pharmacy identity regex is valid")
});

static GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)gen[ée]rico|principio|activo|concentrac")
        .expect("hardcoded generic column regex is valid")
});

static COMMERCIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)marca|concentrac").expect("hardcoded commercial column regex is valid")
});

static GENERIC_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Genérico|Principio|Activo").expect("hardcoded generic marker regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Names the active ingredient (generic listing only).
    Generic,
    /// Names the brand (commercial listing only).
    Commercial,
    /// Describes both listings, e.g. concentration.
    Shared,
    /// Identity column carrying no generic/commercial marker.
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Excluded,
    Identity(IdentityKind),
    Vendor,
}

impl ColumnRole {
    #[must_use]
    pub fn is_identity(self) -> bool {
        matches!(self, Self::Identity(_))
    }
}

/// A page grid narrowed to one output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelView {
    pub channel: Channel,
    pub grid: PageGrid,
    pub roles: Vec<ColumnRole>,
}

impl ChannelView {
    #[must_use]
    pub fn identity_columns(&self) -> Vec<usize> {
        self.columns_where(ColumnRole::is_identity)
    }

    #[must_use]
    pub fn vendor_columns(&self) -> Vec<usize> {
        self.columns_where(|role| role == ColumnRole::Vendor)
    }

    fn columns_where(&self, predicate: impl Fn(ColumnRole) -> bool) -> Vec<usize> {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, role)| predicate(**role))
            .map(|(index, _)| index)
            .collect()
    }
}

const fn positional_identity_count(family: ReportFamily) -> usize {
    match family {
        ReportFamily::Retail => 2,
        ReportFamily::Pharmacy => 4,
    }
}

fn pharmacy_tag(name: &str) -> Option<IdentityKind> {
    match (GENERIC_RE.is_match(name), COMMERCIAL_RE.is_match(name)) {
        (true, true) => Some(IdentityKind::Shared),
        (true, false) => Some(IdentityKind::Generic),
        (false, true) => Some(IdentityKind::Commercial),
        (false, false) => None,
    }
}

/// Assigns a role to every column name.
///
/// Identity columns are the leading run of columns that look like identity
/// fields (retail: at most two). When no column qualifies, the leading
/// columns are taken positionally. In pharmacy surveys any column tagged
/// generic or commercial is identity wherever it sits.
#[must_use]
pub fn classify_columns(family: ReportFamily, columns: &[String]) -> Vec<ColumnRole> {
    let excluded = match family {
        ReportFamily::Retail => &*RETAIL_EXCLUDED_RE,
        ReportFamily::Pharmacy => &*PHARMACY_EXCLUDED_RE,
    };

    let mut roles = columns
        .iter()
        .map(|name| {
            if excluded.is_match(name) {
                ColumnRole::Excluded
            } else {
                ColumnRole::Vendor
            }
        })
        .collect::<Vec<_>>();

    if family == ReportFamily::Pharmacy {
        for (role, name) in roles.iter_mut().zip(columns) {
            if *role == ColumnRole::Vendor {
                if let Some(kind) = pharmacy_tag(name) {
                    *role = ColumnRole::Identity(kind);
                }
            }
        }
    }

    let looks_like_identity = |name: &str| match family {
        ReportFamily::Retail => RETAIL_IDENTITY_RE.is_match(name),
        ReportFamily::Pharmacy => PHARMACY_IDENTITY_RE.is_match(name),
    };
    let limit = match family {
        ReportFamily::Retail => positional_identity_count(family),
        ReportFamily::Pharmacy => usize::MAX,
    };

    let candidates = roles
        .iter()
        .enumerate()
        .filter(|(_, role)| **role != ColumnRole::Excluded)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut leading = 0;
    for &index in &candidates {
        if leading >= limit {
            break;
        }
        match roles[index] {
            ColumnRole::Identity(_) => leading += 1,
            _ if looks_like_identity(&columns[index]) => {
                roles[index] = ColumnRole::Identity(IdentityKind::Ambiguous);
                leading += 1;
            }
            _ => break,
        }
    }

    if !roles.iter().any(|role| role.is_identity()) {
        for &index in candidates.iter().take(positional_identity_count(family)) {
            roles[index] = ColumnRole::Identity(IdentityKind::Ambiguous);
        }
    }

    roles
}

fn strip_generic_markers(name: &str) -> String {
    GENERIC_MARKER_RE.replace_all(name, "").into_owned()
}

/// Drops excluded columns and, for pharmacy pages that carry both generic
/// and commercial identity columns, splits the page into one view per
/// listing. Every other page yields a single view.
#[must_use]
pub fn split_page(family: ReportFamily, grid: &PageGrid) -> Vec<ChannelView> {
    let roles = classify_columns(family, &grid.columns);
    let excluded = roles
        .iter()
        .enumerate()
        .filter(|(_, role)| **role == ColumnRole::Excluded)
        .map(|(index, _)| index)
        .collect::<BTreeSet<_>>();

    let grid = grid.drop_columns(&excluded);
    let roles = roles
        .into_iter()
        .filter(|role| *role != ColumnRole::Excluded)
        .collect::<Vec<_>>();

    let of_kind = |kind: IdentityKind| {
        roles
            .iter()
            .enumerate()
            .filter(|(_, role)| **role == ColumnRole::Identity(kind))
            .map(|(index, _)| index)
            .collect::<BTreeSet<_>>()
    };
    let generic_only = of_kind(IdentityKind::Generic);
    let commercial_only = of_kind(IdentityKind::Commercial);

    if family != ReportFamily::Pharmacy || generic_only.is_empty() || commercial_only.is_empty() {
        return vec![ChannelView {
            channel: Channel::Single,
            grid,
            roles,
        }];
    }

    let without = |dropped: &BTreeSet<usize>| {
        roles
            .iter()
            .enumerate()
            .filter(|(index, _)| !dropped.contains(index))
            .map(|(_, role)| *role)
            .collect::<Vec<_>>()
    };

    let mut generic_grid = grid.drop_columns(&commercial_only);
    generic_grid.columns = generic_grid
        .columns
        .iter()
        .map(|name| strip_generic_markers(name))
        .collect();

    let mut commercial_grid = grid.drop_columns(&generic_only);
    if commercial_grid.width() == generic_grid.width() {
        commercial_grid.columns.clone_from(&generic_grid.columns);
    }

    vec![
        ChannelView {
            channel: Channel::Generic,
            grid: generic_grid,
            roles: without(&commercial_only),
        },
        ChannelView {
            channel: Channel::Commercial,
            grid: commercial_grid,
            roles: without(&generic_only),
        },
    ]
}
