use rand::Rng;

use crate::models::question::{Question, OPTION_COUNT};

/// Moves the correct option to a uniformly random slot and shuffles the distractors.
///
/// Generators tend to put the right answer first; after this every one of the
/// 24 arrangements is reachable and `correct_index` is uniform over `0..4`,
/// independent of where the generator placed it.
pub fn randomize<R: Rng + ?Sized>(question: Question, rng: &mut R) -> Question {
    let Question {
        question,
        options,
        correct_index,
        explanation,
        category,
    } = question;

    let correct_slot = correct_index as usize;
    let mut correct_option = None;
    let mut distractors = Vec::with_capacity(OPTION_COUNT - 1);
    for (i, option) in options.into_iter().enumerate() {
        if i == correct_slot {
            correct_option = Some(option);
        } else {
            distractors.push(option);
        }
    }
    let correct_option = correct_option.unwrap_or_default();

    // Fisher-Yates
    for i in (1..distractors.len()).rev() {
        let j = rng.random_range(0..=i);
        distractors.swap(i, j);
    }

    let new_index = rng.random_range(0..OPTION_COUNT);
    distractors.insert(new_index, correct_option);

    let mut arranged = distractors.into_iter();
    let options: [String; OPTION_COUNT] =
        std::array::from_fn(|_| arranged.next().unwrap_or_default());

    Question {
        question,
        options,
        correct_index: new_index as u8,
        explanation,
        category,
    }
}
