/*!
macOS implementation of the backend boundary.

Thin glue over `AXUIElement`/`AXObserver`/`CGEvent`. Notification
callbacks fire on the process main run loop; a daemon embedding this
backend keeps the main thread in [`MacosBackend::run_notification_loop`]
and serves RPC from a worker thread.
*/

#![allow(unsafe_code)]
#![allow(clippy::expect_used, clippy::cast_possible_wrap)]

mod handle;
mod mapping;

pub use handle::MacosHandle;

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;

use crossbeam_channel::Sender;
use log::{debug, warn};
use objc2_app_kit::{NSApplicationActivationPolicy, NSWorkspace};
use objc2_application_services::{
  AXError, AXIsProcessTrusted, AXObserver, AXUIElement,
};
use objc2_core_foundation::{
  kCFRunLoopDefaultMode, CFRetained, CFRunLoop, CFString, CGPoint,
};
use objc2_core_graphics::{
  CGEvent, CGEventField, CGEventFlags, CGEventSource, CGEventSourceStateID, CGEventTapLocation,
  CGEventType, CGMouseButton,
};
use parking_lot::Mutex;

use super::{Application, Backend, BackendError, BackendResult, ObserverToken};
use crate::a11y::Notification;
use crate::input::{KeyEvent, MouseButton, MouseEvent, MousePhase};
use crate::types::ProcessId;

/// Context handed to the C observer callback through `refcon`.
struct SinkContext {
  sink: Sender<MacosHandle>,
}

/// One live notification registration.
struct Registration {
  observer: CFRetained<AXObserver>,
  element: CFRetained<AXUIElement>,
  notification: &'static str,
  refcon: *mut SinkContext,
}

// SAFETY: the CF objects are reference-counted and only touched under the
// registrations lock; the refcon box is freed exactly once in unobserve.
unsafe impl Send for Registration {}

/// The macOS backend.
#[derive(Default)]
pub struct MacosBackend {
  registrations: Mutex<HashMap<u64, Registration>>,
  next_token: Mutex<u64>,
}

impl std::fmt::Debug for MacosBackend {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MacosBackend").finish_non_exhaustive()
  }
}

impl MacosBackend {
  /// Create the backend.
  pub fn new() -> Self {
    Self::default()
  }

  /// Run the main-thread run loop that services notification callbacks.
  /// Blocks forever; call from `main` after moving RPC serving off-thread.
  pub fn run_notification_loop() {
    CFRunLoop::run();
  }
}

/// Create an `AXUIElement` for an application by PID.
fn app_element(pid: u32) -> CFRetained<AXUIElement> {
  unsafe { AXUIElement::new_application(pid as i32) }
}

unsafe extern "C-unwind" fn observer_callback(
  _observer: NonNull<AXObserver>,
  element: NonNull<AXUIElement>,
  _notification: NonNull<CFString>,
  refcon: *mut c_void,
) {
  use std::panic::AssertUnwindSafe;

  let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
    if refcon.is_null() {
      return;
    }
    let context = unsafe { &*refcon.cast::<SinkContext>() };
    let handle = MacosHandle::new(CFRetained::retain(element));
    drop(context.sink.send(handle));
  }));
  if result.is_err() {
    warn!("accessibility notification handler panicked (possibly invalid element)");
  }
}

impl Backend for MacosBackend {
  type Handle = MacosHandle;

  fn has_permissions(&self) -> bool {
    unsafe { AXIsProcessTrusted() }
  }

  fn applications(&self) -> Vec<Application<MacosHandle>> {
    let workspace = unsafe { NSWorkspace::sharedWorkspace() };
    let running = unsafe { workspace.runningApplications() };
    let mut apps = Vec::new();
    for app in running.iter() {
      // Only ordinary windowed applications; agents and daemons have no
      // addressable windows.
      if unsafe { app.activationPolicy() } != NSApplicationActivationPolicy::Regular {
        continue;
      }
      let pid = unsafe { app.processIdentifier() };
      if pid <= 0 {
        continue;
      }
      let pid = pid as u32;
      let name = unsafe { app.localizedName() }
        .map(|s| s.to_string())
        .unwrap_or_default();
      apps.push(Application {
        name,
        pid: ProcessId(pid),
        handle: MacosHandle::new(app_element(pid)),
      });
    }
    apps
  }

  fn windows(&self, app: &Application<MacosHandle>) -> BackendResult<Vec<MacosHandle>> {
    use crate::backend::ElementHandle;

    let children = app.handle.children()?;
    let mut windows = Vec::new();
    for child in children {
      match child.role() {
        Ok((role, _)) if role.is_window() => windows.push(child),
        Ok(_) => {}
        Err(BackendError::Stale) => {}
        Err(e) => debug!("skipping window candidate of {}: {e}", app.name),
      }
    }
    Ok(windows)
  }

  fn observe(
    &self,
    scope: &MacosHandle,
    kind: Notification,
    sink: Sender<MacosHandle>,
  ) -> BackendResult<ObserverToken> {
    use crate::backend::ElementHandle;

    let pid = scope.pid();
    let observer = unsafe {
      let mut observer_ptr: *mut AXObserver = std::ptr::null_mut();
      let result = AXObserver::create(
        pid as i32,
        Some(observer_callback),
        NonNull::new(&raw mut observer_ptr).expect("stack pointer is never null"),
      );
      if result != AXError::Success {
        return Err(BackendError::Failure(format!(
          "AXObserverCreate failed for PID {pid}: {result:?}"
        )));
      }
      CFRetained::from_raw(
        NonNull::new(observer_ptr)
          .ok_or_else(|| BackendError::Failure("AXObserverCreate returned null".to_string()))?,
      )
    };

    let notification = mapping::notification_to_macos(kind);
    let refcon = Box::into_raw(Box::new(SinkContext { sink }));
    let notification_name = CFString::from_static_str(notification);

    let result = unsafe {
      observer.add_notification(scope.inner(), &notification_name, refcon.cast::<c_void>())
    };
    if result != AXError::Success {
      // Reclaim the context before reporting.
      drop(unsafe { Box::from_raw(refcon) });
      return Err(if result == AXError::InvalidUIElement {
        BackendError::Stale
      } else if result == AXError::NotificationUnsupported {
        BackendError::Unsupported(notification.to_string())
      } else {
        BackendError::Failure(format!("AXObserverAddNotification: {result:?}"))
      });
    }

    // The run loop source must be scheduled for callbacks to fire.
    unsafe {
      let source = observer.run_loop_source();
      if let Some(main_loop) = CFRunLoop::main() {
        main_loop.add_source(Some(&source), kCFRunLoopDefaultMode);
      }
    }

    let mut next = self.next_token.lock();
    let token = *next;
    *next += 1;
    drop(next);
    self.registrations.lock().insert(
      token,
      Registration {
        observer,
        element: CFRetained::retain(NonNull::from(scope.inner())),
        notification,
        refcon,
      },
    );
    Ok(ObserverToken(token))
  }

  fn unobserve(&self, token: ObserverToken) {
    let Some(registration) = self.registrations.lock().remove(&token.0) else {
      return;
    };
    unsafe {
      let notification_name = CFString::from_static_str(registration.notification);
      let result = registration
        .observer
        .remove_notification(&registration.element, &notification_name);
      if result != AXError::Success && result != AXError::NotificationNotRegistered {
        debug!("AXObserverRemoveNotification: {result:?}");
      }
      drop(Box::from_raw(registration.refcon));
    }
  }

  fn post_key(&self, event: &KeyEvent, target: Option<ProcessId>) -> BackendResult<()> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)
      .ok_or_else(|| BackendError::Failure("CGEventSource unavailable".to_string()))?;
    let cg_event = CGEvent::new_keyboard_event(Some(&source), event.code.0, event.down)
      .ok_or_else(|| BackendError::Failure("CGEventCreateKeyboardEvent failed".to_string()))?;
    CGEvent::set_flags(Some(&cg_event), CGEventFlags(event.flags.0));
    post(&cg_event, target);
    Ok(())
  }

  fn post_mouse(&self, event: &MouseEvent, target: Option<ProcessId>) -> BackendResult<()> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)
      .ok_or_else(|| BackendError::Failure("CGEventSource unavailable".to_string()))?;
    let (event_type, button) = match (event.button, event.phase) {
      (MouseButton::Left, MousePhase::Down) => (CGEventType::LeftMouseDown, CGMouseButton::Left),
      (MouseButton::Left, MousePhase::Up) => (CGEventType::LeftMouseUp, CGMouseButton::Left),
      (MouseButton::Left, MousePhase::Moved) => {
        (CGEventType::LeftMouseDragged, CGMouseButton::Left)
      }
      (MouseButton::Right, MousePhase::Down) => {
        (CGEventType::RightMouseDown, CGMouseButton::Right)
      }
      (MouseButton::Right, MousePhase::Up) => (CGEventType::RightMouseUp, CGMouseButton::Right),
      (MouseButton::Right, MousePhase::Moved) => {
        (CGEventType::RightMouseDragged, CGMouseButton::Right)
      }
    };
    let point = CGPoint::new(event.x, event.y);
    let cg_event = CGEvent::new_mouse_event(Some(&source), event_type, point, button)
      .ok_or_else(|| BackendError::Failure("CGEventCreateMouseEvent failed".to_string()))?;
    CGEvent::set_integer_value_field(
      Some(&cg_event),
      CGEventField::MouseEventClickState,
      i64::from(event.click_count),
    );
    CGEvent::set_flags(Some(&cg_event), CGEventFlags(event.flags.0));
    post(&cg_event, target);
    Ok(())
  }
}

fn post(event: &CGEvent, target: Option<ProcessId>) {
  match target {
    Some(pid) => unsafe { CGEvent::post_to_pid(pid.as_u32() as i32, Some(event)) },
    None => unsafe { CGEvent::post(CGEventTapLocation::HIDEventTap, Some(event)) },
  }
}
