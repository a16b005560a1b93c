use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::sync::Arc;

use radio_core::model::{ContentBank, ManualPage, QuestionCategory, RankId, SessionQuestion};

/// Picks the manual pages and quiz questions for one session.
///
/// Filtering is an exact match on `required_rank_id`: a rank only sees its
/// own content, never the content of lower ranks.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    bank: Arc<ContentBank>,
}

impl ContentSelector {
    #[must_use]
    pub fn new(bank: Arc<ContentBank>) -> Self {
        Self { bank }
    }

    #[must_use]
    pub fn bank(&self) -> &ContentBank {
        &self.bank
    }

    /// Pages for `rank`, in authored order.
    ///
    /// A rank with no pages of its own gets the whole manual.
    #[must_use]
    pub fn select_manual_pages(&self, rank: &RankId) -> Vec<ManualPage> {
        let pages: Vec<ManualPage> = self.bank.pages_for(rank).cloned().collect();
        if pages.is_empty() {
            return self.bank.pages().to_vec();
        }
        pages
    }

    /// One randomly chosen variant per category of `rank`, in random order.
    ///
    /// A rank with no categories falls back to the lowest rank's categories;
    /// an empty result means the bank holds no questions for either.
    pub fn select_question_session<R: Rng + ?Sized>(
        &self,
        rank: &RankId,
        rng: &mut R,
    ) -> Vec<SessionQuestion> {
        let mut categories: Vec<&QuestionCategory> = self.bank.categories_for(rank).collect();
        if categories.is_empty() {
            let lowest = &self.bank.ranks().lowest().id;
            tracing::debug!(%rank, %lowest, "no categories for rank, using lowest rank");
            categories = self.bank.categories_for(lowest).collect();
        }

        let mut questions: Vec<SessionQuestion> = categories
            .into_iter()
            .filter_map(|category| {
                category
                    .variants
                    .choose(rng)
                    .map(|variant| SessionQuestion::new(category, variant.clone()))
            })
            .collect();
        questions.shuffle(rng);
        questions
    }
}
