use std::collections::HashSet;
use thiserror::Error;

use crate::model::content::{ManualPage, QuestionCategory, QuestionType, QuestionVariant};
use crate::model::ids::{CategoryId, OptionId, PageId, RankId, VariantId};
use crate::model::rank::RankLadder;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Content-integrity violations detected at load or import time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("category {category} has no variants")]
    EmptyCategory { category: CategoryId },

    #[error("category {category} requires unknown rank {rank}")]
    UnknownCategoryRank { category: CategoryId, rank: RankId },

    #[error("manual page {page} requires unknown rank {rank}")]
    UnknownPageRank { page: PageId, rank: RankId },

    #[error("duplicate category id: {0}")]
    DuplicateCategory(CategoryId),

    #[error("duplicate manual page id: {0}")]
    DuplicatePage(PageId),

    #[error("variant {variant} in {category} has duplicate option {option}")]
    DuplicateOption {
        category: CategoryId,
        variant: VariantId,
        option: OptionId,
    },

    #[error("multiple-choice variant {variant} in {category} has {count} correct options (expected 1)")]
    CorrectOptionCount {
        category: CategoryId,
        variant: VariantId,
        count: usize,
    },

    #[error("timing variant {variant} in {category} must carry exactly one correct option")]
    TimingOptionShape {
        category: CategoryId,
        variant: VariantId,
    },
}

fn check_variant(category: &QuestionCategory, variant: &QuestionVariant) -> Result<(), ContentError> {
    let mut seen = HashSet::new();
    for option in &variant.options {
        if !seen.insert(&option.id) {
            return Err(ContentError::DuplicateOption {
                category: category.id.clone(),
                variant: variant.id.clone(),
                option: option.id.clone(),
            });
        }
    }

    match variant.kind {
        QuestionType::MultipleChoice => {
            let count = variant.correct_count();
            if count != 1 {
                return Err(ContentError::CorrectOptionCount {
                    category: category.id.clone(),
                    variant: variant.id.clone(),
                    count,
                });
            }
        }
        QuestionType::PttTiming => {
            if variant.options.len() != 1 || variant.correct_count() != 1 {
                return Err(ContentError::TimingOptionShape {
                    category: category.id.clone(),
                    variant: variant.id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Validate a question bank against a rank ladder.
///
/// # Errors
///
/// Returns the first `ContentError` found, in authored order.
pub fn validate_categories(
    ranks: &RankLadder,
    categories: &[QuestionCategory],
) -> Result<(), ContentError> {
    let mut ids = HashSet::new();
    for category in categories {
        if !ids.insert(&category.id) {
            return Err(ContentError::DuplicateCategory(category.id.clone()));
        }
        if !ranks.contains(&category.required_rank_id) {
            return Err(ContentError::UnknownCategoryRank {
                category: category.id.clone(),
                rank: category.required_rank_id.clone(),
            });
        }
        if category.variants.is_empty() {
            return Err(ContentError::EmptyCategory {
                category: category.id.clone(),
            });
        }
        for variant in &category.variants {
            check_variant(category, variant)?;
        }
    }
    Ok(())
}

/// Validate manual pages against a rank ladder.
///
/// # Errors
///
/// Returns the first `ContentError` found, in authored order.
pub fn validate_pages(ranks: &RankLadder, pages: &[ManualPage]) -> Result<(), ContentError> {
    let mut ids = HashSet::new();
    for page in pages {
        if !ids.insert(page.id) {
            return Err(ContentError::DuplicatePage(page.id));
        }
        if !ranks.contains(&page.required_rank_id) {
            return Err(ContentError::UnknownPageRank {
                page: page.id,
                rank: page.required_rank_id.clone(),
            });
        }
    }
    Ok(())
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Validated, read-only content: ranks, manual pages and question categories.
///
/// Once built, every item references a known rank and every category has at
/// least one well-formed variant, so sessions never discover broken content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBank {
    ranks: RankLadder,
    pages: Vec<ManualPage>,
    categories: Vec<QuestionCategory>,
}

impl ContentBank {
    /// # Errors
    ///
    /// Returns `ContentError` if any page or category violates content integrity.
    pub fn new(
        ranks: RankLadder,
        pages: Vec<ManualPage>,
        categories: Vec<QuestionCategory>,
    ) -> Result<Self, ContentError> {
        validate_pages(&ranks, &pages)?;
        validate_categories(&ranks, &categories)?;
        Ok(Self {
            ranks,
            pages,
            categories,
        })
    }

    #[must_use]
    pub fn ranks(&self) -> &RankLadder {
        &self.ranks
    }

    #[must_use]
    pub fn pages(&self) -> &[ManualPage] {
        &self.pages
    }

    #[must_use]
    pub fn categories(&self) -> &[QuestionCategory] {
        &self.categories
    }

    pub fn pages_for<'a>(&'a self, rank: &'a RankId) -> impl Iterator<Item = &'a ManualPage> + 'a {
        self.pages.iter().filter(move |p| &p.required_rank_id == rank)
    }

    pub fn categories_for<'a>(
        &'a self,
        rank: &'a RankId,
    ) -> impl Iterator<Item = &'a QuestionCategory> + 'a {
        self.categories
            .iter()
            .filter(move |c| &c.required_rank_id == rank)
    }
}
