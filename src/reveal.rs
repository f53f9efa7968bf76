//! Typewriter-style reveal of an already complete reply.
//!
//! Purely cosmetic: the reply has been received in full before the reveal
//! starts, and nothing here touches the transcript.

use std::io::Write;
use std::time::Duration;

use futures::{Stream, StreamExt, stream};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Delay between revealed characters.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(16);

struct RevealState {
    text: String,
    /// Byte offsets at which each successive prefix ends.
    ends: Vec<usize>,
    next: usize,
    period: Duration,
    ticker: Option<Interval>,
}

/// Successively longer prefixes of `text`, one more character per tick.
///
/// The first prefix arrives one `interval` after the stream is first polled
/// and the last item is always the full text. An empty text yields a single
/// empty prefix.
pub fn reveal(text: impl Into<String>, interval: Duration) -> impl Stream<Item = String> {
    let text = text.into();
    let mut ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    if ends.is_empty() {
        ends.push(0);
    }

    let state = RevealState {
        text,
        ends,
        next: 0,
        period: interval.max(Duration::from_micros(1)),
        ticker: None,
    };

    stream::unfold(state, |mut st| async move {
        let end = *st.ends.get(st.next)?;
        let period = st.period;
        let ticker = st.ticker.get_or_insert_with(|| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
        st.next += 1;
        let prefix = st.text[..end].to_string();
        Some((prefix, st))
    })
}

/// Run a reveal to completion, writing each newly revealed slice to `out`.
pub async fn reveal_to<W: Write>(
    out: &mut W,
    text: &str,
    interval: Duration,
) -> std::io::Result<()> {
    let mut shown = 0;
    let mut prefixes = Box::pin(reveal(text, interval));
    while let Some(prefix) = prefixes.next().await {
        out.write_all(prefix[shown..].as_bytes())?;
        out.flush()?;
        shown = prefix.len();
    }
    Ok(())
}
