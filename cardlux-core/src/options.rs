use crate::models::{Card, Direction};
use crate::CoreError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISTRACTORS: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceSet {
    pub options: Vec<String>,
    pub correct_index: usize,
    pub correct_answer: String,
}

pub fn build_choices(
    target: &Card,
    pool: &[Card],
    direction: Direction,
    count: usize,
) -> Result<ChoiceSet, CoreError> {
    build_choices_with_rng(target, pool, direction, count, &mut rand::thread_rng())
}

/// Collects `count` distractors by walking the tier cascade, then shuffles
/// the correct answer in among them. Distractors come only from cards of the
/// target's kind so phrase prompts never mix with single words.
pub fn build_choices_with_rng<R: Rng + ?Sized>(
    target: &Card,
    pool: &[Card],
    direction: Direction,
    count: usize,
    rng: &mut R,
) -> Result<ChoiceSet, CoreError> {
    let correct = target.answer(direction).to_string();

    let candidates: Vec<&Card> = pool
        .iter()
        .filter(|c| {
            c.id != target.id
                && !c.suspended
                && c.kind.is_phrase() == target.kind.is_phrase()
        })
        .collect();

    // Tiers partition the candidates; earlier tiers are closer to the target.
    let tiers: [&dyn Fn(&Card) -> bool; 4] = [
        &|c| c.topic_id == target.topic_id && c.difficulty == target.difficulty,
        &|c| c.topic_id == target.topic_id && c.difficulty != target.difficulty,
        &|c| c.topic_id != target.topic_id && c.difficulty == target.difficulty,
        &|c| c.topic_id != target.topic_id && c.difficulty != target.difficulty,
    ];

    let mut distractors: Vec<String> = Vec::new();
    'tiers: for tier in tiers {
        for &card in &candidates {
            if !tier(card) {
                continue;
            }
            let answer = card.answer(direction);
            if answer != correct && !distractors.iter().any(|d| d == answer) {
                distractors.push(answer.to_string());
                if distractors.len() == count {
                    break 'tiers;
                }
            }
        }
    }

    if distractors.len() < count {
        return Err(CoreError::InsufficientOptions {
            needed: count,
            found: distractors.len(),
        });
    }

    let mut options = Vec::with_capacity(count + 1);
    options.push(correct.clone());
    options.extend(distractors);
    options.shuffle(rng);

    let correct_index = options
        .iter()
        .position(|o| o == &correct)
        .ok_or(CoreError::Invalid("correct answer lost in shuffle"))?;

    Ok(ChoiceSet {
        options,
        correct_index,
        correct_answer: correct,
    })
}
