/*!
 * Chunk planning.
 *
 * Cues are grouped into fixed-size batches. Each batch carries a few
 * neighbouring cues on either side as read-only context so the model sees
 * the surrounding dialogue without translating it twice.
 */

use crate::subtitle_processor::Cue;

/// A batch of consecutive cues translated in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based chunk number
    pub index: usize,

    /// Position of the first line in the planned cue sequence
    pub offset: usize,

    /// Cues to translate
    pub lines: Vec<Cue>,

    /// Cues immediately preceding `lines`
    pub context_before: Vec<Cue>,

    /// Cues immediately following `lines`
    pub context_after: Vec<Cue>,
}

impl Chunk {
    /// Source indices of the cues to translate
    pub fn cue_indices(&self) -> Vec<usize> {
        self.lines.iter().map(|cue| cue.index).collect()
    }
}

/// Split `cues` into chunks of `chunk_size` with `context_window` cues of
/// context on each side.
///
/// The last chunk may be shorter. A `chunk_size` of 0 is treated as 1.
pub fn plan(cues: &[Cue], chunk_size: usize, context_window: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);

    cues.chunks(chunk_size)
        .enumerate()
        .map(|(index, lines)| {
            let offset = index * chunk_size;
            let end = offset + lines.len();
            let before_start = offset.saturating_sub(context_window);
            let after_end = end.saturating_add(context_window).min(cues.len());

            Chunk {
                index,
                offset,
                lines: lines.to_vec(),
                context_before: cues[before_start..offset].to_vec(),
                context_after: cues[end..after_end].to_vec(),
            }
        })
        .collect()
}
