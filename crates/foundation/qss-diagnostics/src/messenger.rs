//! Value-or-failure results that carry messages
#![allow(
    clippy::min_ident_chars,
    reason = "T and U are conventional names for the carried values"
)]

use crate::{Message, Severity};

/// A computed value or a failure, plus the messages produced either way
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messenger<T> {
    value: Option<T>,
    messages: Vec<Message>,
}

impl<T> Messenger<T> {
    /// A successful result with no messages
    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            messages: Vec::new(),
        }
    }

    /// A successful result that still reports messages, e.g. warnings
    pub fn success_with(value: T, messages: Vec<Message>) -> Self {
        Self {
            value: Some(value),
            messages,
        }
    }

    /// A failed result
    pub fn fail(messages: Vec<Message>) -> Self {
        Self {
            value: None,
            messages,
        }
    }

    /// Whether a value was produced
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// The value, if one was produced
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Messages reported so far, in order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether any reported message is an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.severity == Severity::Error)
    }

    /// Split into the optional value and the messages
    #[must_use]
    pub fn into_parts(self) -> (Option<T>, Vec<Message>) {
        (self.value, self.messages)
    }

    /// Move the messages into `sink` and return the value
    pub fn report_into(self, sink: &mut Vec<Message>) -> Option<T> {
        sink.extend(self.messages);
        self.value
    }

    /// Append a message without changing success
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append messages without changing success
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Transform the value, keeping the messages
    pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> Messenger<U> {
        Messenger {
            value: self.value.map(transform),
            messages: self.messages,
        }
    }

    /// Run the next step on the value; messages of both steps are concatenated in order
    ///
    /// The next step does not run if this one failed.
    pub fn and_then<U>(self, next: impl FnOnce(T) -> Messenger<U>) -> Messenger<U> {
        let mut messages = self.messages;
        let Some(value) = self.value else {
            return Messenger::fail(messages);
        };
        let following = next(value);
        messages.extend(following.messages);
        Messenger {
            value: following.value,
            messages,
        }
    }

    /// Combine with an independent result; succeeds only if both succeeded
    pub fn zip<U>(self, other: Messenger<U>) -> Messenger<(T, U)> {
        let mut messages = self.messages;
        messages.extend(other.messages);
        Messenger {
            value: self.value.zip(other.value),
            messages,
        }
    }
}

/// Collects many results into one list result
///
/// Adding a failed item fails the whole list, but collection carries on so that every item's
/// messages are reported.
#[must_use]
#[derive(Debug, Clone)]
pub struct MessengerList<T> {
    values: Option<Vec<T>>,
    messages: Vec<Message>,
}

impl<T> MessengerList<T> {
    /// An empty, successful list
    pub fn new() -> Self {
        Self {
            values: Some(Vec::new()),
            messages: Vec::new(),
        }
    }

    /// Add one item's result
    pub fn push(&mut self, item: Messenger<T>) {
        let (value, messages) = item.into_parts();
        self.messages.extend(messages);
        match (self.values.as_mut(), value) {
            (Some(values), Some(value)) => values.push(value),
            (_, None) => self.values = None,
            (None, Some(_)) => {}
        }
    }

    /// Finish into a single result
    pub fn finish(self) -> Messenger<Vec<T>> {
        Messenger {
            value: self.values,
            messages: self.messages,
        }
    }
}

impl<T> Default for MessengerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Messenger<T>> for MessengerList<T> {
    fn from_iter<I: IntoIterator<Item = Messenger<T>>>(iter: I) -> Self {
        let mut list = Self::new();
        for item in iter {
            list.push(item);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qss_span::Range;

    fn note(text: &str) -> Message {
        Message::warning(Range::default(), text)
    }

    #[test]
    fn test_and_then_concatenates_in_order() {
        let combined = Messenger::success_with(1, vec![note("first")])
            .and_then(|value| Messenger::success_with(value + 1, vec![note("second")]));
        assert_eq!(combined.value(), Some(&2));
        let texts: Vec<_> = combined.messages().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn test_later_failure_keeps_earlier_warnings() {
        let combined: Messenger<i32> = Messenger::success_with(1, vec![note("kept")])
            .and_then(|_| Messenger::fail(vec![Message::error(Range::default(), "broke")]));
        assert!(!combined.is_success());
        assert_eq!(combined.messages().len(), 2);
        assert!(combined.has_errors());
    }

    #[test]
    fn test_failure_skips_next_step() {
        let mut ran = false;
        let combined: Messenger<i32> = Messenger::<i32>::fail(vec![note("only")]).and_then(|value| {
            ran = true;
            Messenger::success(value)
        });
        assert!(!ran);
        assert_eq!(combined.messages().len(), 1);
    }

    #[test]
    fn test_zip_requires_both() {
        let both = Messenger::success(1).zip(Messenger::success("a"));
        assert_eq!(both.value(), Some(&(1, "a")));
        let one = Messenger::success(1).zip(Messenger::<&str>::fail(vec![note("x")]));
        assert!(!one.is_success());
        assert_eq!(one.messages().len(), 1);
    }

    #[test]
    fn test_list_fails_if_any_item_fails() {
        let list: MessengerList<i32> = vec![
            Messenger::success(1),
            Messenger::fail(vec![note("bad")]),
            Messenger::success_with(3, vec![note("late")]),
        ]
        .into_iter()
        .collect();
        let finished = list.finish();
        assert!(!finished.is_success());
        assert_eq!(finished.messages().len(), 2);

        let ok: MessengerList<i32> = vec![Messenger::success(1), Messenger::success(2)]
            .into_iter()
            .collect();
        assert_eq!(ok.finish().value(), Some(&vec![1, 2]));
    }
}
