//! Statistical dialect inference.
//!
//! A single scan of the sample scores separator and quote candidates
//! ([`temp_stats`]), the scores are combined and ranked along with the
//! comment prefix and escape byte guesses ([`score`]), and each ranked
//! guess can be checked by tokenizing the sample ([`verify`]).

pub(crate) mod score;
pub(crate) mod temp_stats;
pub(crate) mod verify;

pub(crate) use score::{guess_comment, guess_escape, rank_sep_quote};
pub(crate) use verify::rows_consistent;
