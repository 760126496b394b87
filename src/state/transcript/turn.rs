use crate::types::Event;

/// Returns the events of the current, not yet persisted turn.
///
/// A turn starts at an `assistant` event that is either the first event or
/// directly follows a `result`. The first `persisted_count` turns are skipped.
/// When the log holds no more turns than that (a resumed session that only
/// replayed history), whatever trails the last `result` is returned, which
/// is empty when the log ends on a `result`.
pub fn filter_to_current_turn(events: &[Event], persisted_count: usize) -> &[Event] {
    if persisted_count == 0 {
        return events;
    }

    let mut turns = 0;
    for (index, event) in events.iter().enumerate() {
        if !event.is_assistant() {
            continue;
        }
        let starts_turn = index == 0 || events[index - 1].is_result();
        if starts_turn {
            turns += 1;
            if turns > persisted_count {
                return &events[index..];
            }
        }
    }

    match events.iter().rposition(Event::is_result) {
        Some(last_result) if last_result + 1 < events.len() => &events[last_result + 1..],
        _ => &[],
    }
}
