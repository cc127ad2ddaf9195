/*!
Event synthesis queue.

Keyboard and mouse-button events queue independently; `flush` replays a
queue in FIFO order with a fixed inter-event delay and leaves it empty.
*/

use std::sync::Arc;
use std::time::Duration;

use super::keymap::{Modifier, ModifierFlags};
use super::{KeyEvent, MouseButton, MouseEvent, MousePhase};
use crate::backend::Backend;
use crate::types::{AxRemoteError, AxRemoteResult, ProcessId};

/// Default pacing between replayed events.
pub const DEFAULT_EVENT_INTERVAL: Duration = Duration::from_millis(10);

/// Batches hardware events and replays them in order.
///
/// Events are posted globally unless a target process is set. Flushing
/// blocks the caller for `queue length x interval`.
pub struct EventQueue<B: Backend> {
  backend: Arc<B>,
  target: Option<ProcessId>,
  keys: Vec<KeyEvent>,
  mouse: Vec<MouseEvent>,
  held: ModifierFlags,
  held_order: Vec<Modifier>,
}

impl<B: Backend> std::fmt::Debug for EventQueue<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EventQueue")
      .field("keys", &self.keys.len())
      .field("mouse", &self.mouse.len())
      .field("held", &self.held)
      .finish_non_exhaustive()
  }
}

impl<B: Backend> EventQueue<B> {
  /// Create an empty queue posting through `backend`.
  pub fn new(backend: Arc<B>) -> Self {
    Self {
      backend,
      target: None,
      keys: Vec::new(),
      mouse: Vec::new(),
      held: ModifierFlags::NONE,
      held_order: Vec::new(),
    }
  }

  /// Address all subsequently flushed events to one process
  /// (`None` posts globally).
  pub fn set_target(&mut self, target: Option<ProcessId>) {
    self.target = target;
  }

  /// Modifier set currently held by [`EventQueue::press_modifiers`].
  pub const fn held(&self) -> ModifierFlags {
    self.held
  }

  /// Append one keyboard event without posting. The held-modifier mask is
  /// folded into the event's flags.
  pub fn queue_key(&mut self, event: KeyEvent) {
    self.keys.push(KeyEvent {
      flags: event.flags | self.held,
      ..event
    });
  }

  /// Append one mouse event without posting.
  pub fn queue_mouse(&mut self, event: MouseEvent) {
    self.mouse.push(MouseEvent {
      flags: event.flags | self.held,
      ..event
    });
  }

  /// Queue a parsed combo string (see [`super::parse_combo`]).
  pub fn queue_combo(&mut self, combo: &str) -> AxRemoteResult<()> {
    for event in super::parse_combo(combo)? {
      self.queue_key(event);
    }
    Ok(())
  }

  /// Press and hold modifiers. Held modifiers flag every event queued
  /// until the matching release.
  pub fn press_modifiers(&mut self, modifiers: &[Modifier]) {
    for &modifier in modifiers {
      if self.held_order.contains(&modifier) {
        continue;
      }
      self.held |= modifier.flag();
      self.held_order.push(modifier);
      let flags = self.held;
      self.keys.push(KeyEvent {
        code: modifier.key_code(),
        down: true,
        flags,
      });
    }
  }

  /// Release modifiers, posting the up-events in reverse order of the
  /// given set to mirror physical key ordering.
  pub fn release_modifiers(&mut self, modifiers: &[Modifier]) {
    for &modifier in modifiers.iter().rev() {
      if let Some(pos) = self.held_order.iter().position(|&m| m == modifier) {
        self.held_order.remove(pos);
        self.held = self.held.without(modifier.flag());
        self.keys.push(KeyEvent {
          code: modifier.key_code(),
          down: false,
          flags: self.held,
        });
      }
    }
  }

  /// Queue a click: one (down, up) pair at a screen coordinate.
  pub fn click(&mut self, x: f64, y: f64, button: MouseButton) {
    self.queue_click_pairs(x, y, button, 1);
  }

  /// Queue a double-click: two (down, up) pairs sharing the coordinate,
  /// click count recorded as 2.
  pub fn double_click(&mut self, x: f64, y: f64, button: MouseButton) {
    self.queue_click_pairs(x, y, button, 2);
  }

  /// Queue a drag: down at the origin, an intermediate moved event, up at
  /// the destination.
  pub fn drag(&mut self, from: (f64, f64), to: (f64, f64), button: MouseButton) {
    let flags = self.held;
    self.mouse.push(MouseEvent {
      button,
      phase: MousePhase::Down,
      x: from.0,
      y: from.1,
      click_count: 1,
      flags,
    });
    self.mouse.push(MouseEvent {
      button,
      phase: MousePhase::Moved,
      x: to.0,
      y: to.1,
      click_count: 1,
      flags,
    });
    self.mouse.push(MouseEvent {
      button,
      phase: MousePhase::Up,
      x: to.0,
      y: to.1,
      click_count: 1,
      flags,
    });
  }

  fn queue_click_pairs(&mut self, x: f64, y: f64, button: MouseButton, count: u8) {
    let flags = self.held;
    for _ in 0..count {
      self.mouse.push(MouseEvent {
        button,
        phase: MousePhase::Down,
        x,
        y,
        click_count: count,
        flags,
      });
      self.mouse.push(MouseEvent {
        button,
        phase: MousePhase::Up,
        x,
        y,
        click_count: count,
        flags,
      });
    }
  }

  /// Replay the keyboard queue in FIFO order with `interval` between
  /// events, then clear it. The queue is emptied even if posting fails
  /// part-way so a retry never double-posts.
  pub fn flush_keys(&mut self, interval: Duration) -> AxRemoteResult<()> {
    let events = std::mem::take(&mut self.keys);
    let mut first = true;
    for event in &events {
      if !first {
        std::thread::sleep(interval);
      }
      first = false;
      self
        .backend
        .post_key(event, self.target)
        .map_err(|e| AxRemoteError::Platform(e.to_string()))?;
    }
    Ok(())
  }

  /// Replay the mouse queue in FIFO order with `interval` between events,
  /// then clear it.
  pub fn flush_mouse(&mut self, interval: Duration) -> AxRemoteResult<()> {
    let events = std::mem::take(&mut self.mouse);
    let mut first = true;
    for event in &events {
      if !first {
        std::thread::sleep(interval);
      }
      first = false;
      self
        .backend
        .post_mouse(event, self.target)
        .map_err(|e| AxRemoteError::Platform(e.to_string()))?;
    }
    Ok(())
  }

  /// Flush both queues (keyboard first).
  pub fn flush(&mut self, interval: Duration) -> AxRemoteResult<()> {
    self.flush_keys(interval)?;
    self.flush_mouse(interval)
  }

  /// Number of queued, not-yet-posted events across both queues.
  pub fn pending(&self) -> usize {
    self.keys.len() + self.mouse.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::fake::FakeBackend;
  use crate::backend::fake::PostedEvent;
  use crate::input::KeyCode;

  fn queue() -> (Arc<FakeBackend>, EventQueue<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    let q = EventQueue::new(Arc::clone(&backend));
    (backend, q)
  }

  #[test]
  fn flush_replays_in_fifo_order_and_clears() {
    let (backend, mut q) = queue();
    let a = KeyCode(0x00);
    let b = KeyCode(0x0B);
    for (code, down) in [(a, true), (a, false), (b, true), (b, false)] {
      q.queue_key(KeyEvent {
        code,
        down,
        flags: ModifierFlags::NONE,
      });
    }
    q.flush_keys(Duration::ZERO).unwrap();

    let posted = backend.posted();
    let keys: Vec<(KeyCode, bool)> = posted
      .iter()
      .filter_map(|e| match e {
        PostedEvent::Key(k, _) => Some((k.code, k.down)),
        PostedEvent::Mouse(..) => None,
      })
      .collect();
    assert_eq!(keys, vec![(a, true), (a, false), (b, true), (b, false)]);
    assert_eq!(q.pending(), 0);

    // Queuing after a flush starts from an empty queue.
    q.queue_key(KeyEvent {
      code: a,
      down: true,
      flags: ModifierFlags::NONE,
    });
    assert_eq!(q.pending(), 1);
  }

  #[test]
  fn held_modifiers_flag_queued_events() {
    let (_, mut q) = queue();
    q.press_modifiers(&[Modifier::Command]);
    q.queue_key(KeyEvent {
      code: KeyCode(0x08),
      down: true,
      flags: ModifierFlags::NONE,
    });
    q.release_modifiers(&[Modifier::Command]);
    // press + key + release
    assert_eq!(q.pending(), 3);
    assert!(q.held().is_empty());
  }

  #[test]
  fn release_order_mirrors_press_order() {
    let (backend, mut q) = queue();
    q.press_modifiers(&[Modifier::Command, Modifier::Shift]);
    q.release_modifiers(&[Modifier::Command, Modifier::Shift]);
    q.flush_keys(Duration::ZERO).unwrap();

    let posted = backend.posted();
    let ups: Vec<KeyCode> = posted
      .iter()
      .filter_map(|e| match e {
        PostedEvent::Key(k, _) if !k.down => Some(k.code),
        PostedEvent::Key(..) | PostedEvent::Mouse(..) => None,
      })
      .collect();
    assert_eq!(
      ups,
      vec![Modifier::Shift.key_code(), Modifier::Command.key_code()]
    );
  }

  #[test]
  fn double_click_records_click_count() {
    let (backend, mut q) = queue();
    q.double_click(10.0, 20.0, MouseButton::Left);
    q.flush_mouse(Duration::ZERO).unwrap();

    let posted = backend.posted();
    let clicks: Vec<(MousePhase, u8)> = posted
      .iter()
      .filter_map(|e| match e {
        PostedEvent::Mouse(m, _) => Some((m.phase, m.click_count)),
        PostedEvent::Key(..) => None,
      })
      .collect();
    assert_eq!(
      clicks,
      vec![
        (MousePhase::Down, 2),
        (MousePhase::Up, 2),
        (MousePhase::Down, 2),
        (MousePhase::Up, 2)
      ]
    );
  }

  #[test]
  fn drag_posts_down_moved_up() {
    let (backend, mut q) = queue();
    q.drag((0.0, 0.0), (50.0, 60.0), MouseButton::Left);
    q.flush_mouse(Duration::ZERO).unwrap();

    let posted = backend.posted();
    let phases: Vec<MousePhase> = posted
      .iter()
      .filter_map(|e| match e {
        PostedEvent::Mouse(m, _) => Some(m.phase),
        PostedEvent::Key(..) => None,
      })
      .collect();
    assert_eq!(
      phases,
      vec![MousePhase::Down, MousePhase::Moved, MousePhase::Up]
    );
  }

  #[test]
  fn target_is_recorded_on_posted_events() {
    let (backend, mut q) = queue();
    q.set_target(Some(ProcessId(42)));
    q.click(1.0, 1.0, MouseButton::Left);
    q.flush_mouse(Duration::ZERO).unwrap();
    let posted = backend.posted();
    assert!(posted
      .iter()
      .all(|e| matches!(e, PostedEvent::Mouse(_, Some(ProcessId(42))))));
  }
}
