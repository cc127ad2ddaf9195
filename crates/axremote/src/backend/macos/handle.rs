/*!
Opaque macOS element handle with safe accessor methods.

All per-element unsafe FFI is encapsulated here; the rest of the crate
interacts with elements through [`ElementHandle`] only. `AXError` codes
map onto the backend taxonomy: `InvalidUIElement`/`Cannot complete` mean
the handle went stale, `AttributeUnsupported`/`ActionUnsupported` mean
the element does not offer the request.
*/

#![allow(unsafe_code)]
#![allow(
  clippy::expect_used, // NonNull::new on stack pointers - never null
  clippy::cast_possible_wrap
)]

use std::ptr::NonNull;

use objc2_application_services::{AXError, AXUIElement};
use objc2_core_foundation::{CFBoolean, CFNumber, CFRetained, CFString, CFType};

use super::mapping::{action_to_macos, role_from_macos};
use crate::a11y::{Action, Role, Value};
use crate::backend::{BackendError, BackendResult, ElementHandle};

/// Opaque handle to a UI element. Clone is cheap (reference counted).
#[derive(Clone)]
pub struct MacosHandle {
  inner: CFRetained<AXUIElement>,
  /// Cached PID (extracted once at construction).
  cached_pid: u32,
}

impl std::fmt::Debug for MacosHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MacosHandle")
      .field("pid", &self.cached_pid)
      .finish_non_exhaustive()
  }
}

// SAFETY: AXUIElement is a CFTypeRef (reference-counted, thread-safe to
// retain/release); all mutation goes through the AX API itself.
unsafe impl Send for MacosHandle {}
unsafe impl Sync for MacosHandle {}

fn map_ax_error(code: AXError, what: &str) -> BackendError {
  if code == AXError::InvalidUIElement || code == AXError::CannotComplete {
    BackendError::Stale
  } else if code == AXError::AttributeUnsupported
    || code == AXError::ActionUnsupported
    || code == AXError::NoValue
    || code == AXError::NotificationUnsupported
  {
    BackendError::Unsupported(what.to_string())
  } else {
    BackendError::Failure(format!("{what}: AXError {code:?}"))
  }
}

impl MacosHandle {
  pub(in crate::backend::macos) fn new(element: CFRetained<AXUIElement>) -> Self {
    let cached_pid = unsafe {
      let mut pid: i32 = 0;
      let result = element.pid(NonNull::new_unchecked(&raw mut pid));
      if result == AXError::Success {
        pid as u32
      } else {
        0
      }
    };
    Self {
      inner: element,
      cached_pid,
    }
  }

  pub(in crate::backend::macos) fn inner(&self) -> &AXUIElement {
    &self.inner
  }

  /// Copy one attribute value, mapping AX error codes.
  fn raw_attr(&self, attr: &str) -> BackendResult<CFRetained<CFType>> {
    let attr_name = CFString::from_str(attr);
    unsafe {
      let mut value: *const CFType = std::ptr::null();
      let result = self
        .inner
        .copy_attribute_value(&attr_name, NonNull::new(&raw mut value).expect("value ptr"));
      if result != AXError::Success {
        return Err(map_ax_error(result, attr));
      }
      if value.is_null() {
        return Err(BackendError::Unsupported(attr.to_string()));
      }
      Ok(CFRetained::from_raw(NonNull::new_unchecked(
        value.cast_mut(),
      )))
    }
  }

  fn string_attr(&self, attr: &str) -> BackendResult<String> {
    let value = self.raw_attr(attr)?;
    value
      .downcast_ref::<CFString>()
      .map(CFString::to_string)
      .ok_or_else(|| BackendError::Unsupported(attr.to_string()))
  }
}

impl ElementHandle for MacosHandle {
  fn pid(&self) -> u32 {
    self.cached_pid
  }

  fn role(&self) -> BackendResult<(Role, String)> {
    let role = self.string_attr("AXRole")?;
    let subrole = self.string_attr("AXSubrole").ok();
    let mapped = role_from_macos(&role, subrole.as_deref());
    let raw = match subrole {
      Some(sub) => format!("{role}/{sub}"),
      None => role,
    };
    Ok((mapped, raw))
  }

  fn title(&self) -> BackendResult<String> {
    self.string_attr("AXTitle")
  }

  fn value(&self) -> BackendResult<Value> {
    let value = self.raw_attr("AXValue")?;
    if let Some(s) = value.downcast_ref::<CFString>() {
      return Ok(Value::String(s.to_string()));
    }
    if let Some(n) = value.downcast_ref::<CFNumber>() {
      if let Some(f) = n.as_f64() {
        return Ok(Value::Number(f));
      }
    }
    if let Some(b) = value.downcast_ref::<CFBoolean>() {
      return Ok(Value::Boolean(b.value()));
    }
    Err(BackendError::Unsupported("AXValue".to_string()))
  }

  fn set_value(&self, value: &Value) -> BackendResult<()> {
    let attr = CFString::from_static_str("AXValue");
    let result = unsafe {
      match value {
        Value::String(s) => {
          let cf_value = CFString::from_str(s);
          self.inner.set_attribute_value(&attr, &cf_value)
        }
        Value::Boolean(b) => {
          // macOS checkboxes use CFNumber 0/1, not CFBoolean.
          let cf_value = CFNumber::new_i32(i32::from(*b));
          self.inner.set_attribute_value(&attr, &cf_value)
        }
        Value::Number(n) => {
          let cf_value = CFNumber::new_f64(*n);
          self.inner.set_attribute_value(&attr, &cf_value)
        }
      }
    };
    if result == AXError::Success {
      Ok(())
    } else {
      Err(map_ax_error(result, "AXValue (set)"))
    }
  }

  fn description(&self) -> BackendResult<String> {
    self.string_attr("AXDescription")
  }

  fn role_description(&self) -> BackendResult<String> {
    self.string_attr("AXRoleDescription")
  }

  fn enabled(&self) -> BackendResult<bool> {
    let value = self.raw_attr("AXEnabled")?;
    value
      .downcast_ref::<CFBoolean>()
      .map(CFBoolean::value)
      .ok_or_else(|| BackendError::Unsupported("AXEnabled".to_string()))
  }

  fn children(&self) -> BackendResult<Vec<Self>> {
    use objc2_core_foundation::CFArray;

    let value = self.raw_attr("AXChildren")?;
    let Ok(array) = value.downcast::<CFArray>() else {
      return Ok(Vec::new());
    };
    // SAFETY: AXChildren always holds AXUIElements.
    let typed: CFRetained<CFArray<AXUIElement>> = unsafe { CFRetained::cast_unchecked(array) };
    let len = typed.len();
    let mut children = Vec::with_capacity(len);
    for i in 0..len {
      if let Some(child) = typed.get(i) {
        children.push(MacosHandle::new(child));
      }
    }
    Ok(children)
  }

  fn perform(&self, action: Action) -> BackendResult<()> {
    let action_name = CFString::from_static_str(action_to_macos(action));
    let result = unsafe { self.inner.perform_action(&action_name) };
    if result == AXError::Success {
      Ok(())
    } else {
      Err(map_ax_error(result, action_to_macos(action)))
    }
  }
}
