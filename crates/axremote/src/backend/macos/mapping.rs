/*!
Mappings between axremote accessibility types and macOS AX* strings.
*/

use crate::a11y::{Action, Notification, Role};

/// Map a macOS `AXRole` (and optional `AXSubrole`) to a semantic role.
pub(super) fn role_from_macos(role: &str, subrole: Option<&str>) -> Role {
  match role {
    "AXWindow" => match subrole {
      Some("AXDialog" | "AXSystemDialog") => Role::Dialog,
      _ => Role::Window,
    },
    "AXSheet" => Role::Sheet,
    "AXApplication" => Role::Application,
    "AXGroup" => Role::Group,
    "AXScrollArea" => Role::ScrollArea,
    "AXToolbar" => Role::Toolbar,
    "AXMenu" => Role::Menu,
    "AXMenuBar" => Role::MenuBar,
    "AXMenuItem" | "AXMenuBarItem" => Role::MenuItem,
    "AXRadioButton" => match subrole {
      // Tab groups expose their tabs as radio buttons.
      Some("AXTabButton") => Role::Tab,
      _ => Role::RadioButton,
    },
    "AXTabGroup" => Role::TabList,
    "AXList" => Role::List,
    "AXCell" => Role::Cell,
    "AXRow" => match subrole {
      Some("AXOutlineRow") => Role::TreeItem,
      _ => Role::Row,
    },
    "AXTable" => Role::Table,
    "AXOutline" => Role::Tree,
    "AXButton" | "AXPopUpButton" => Role::Button,
    "AXLink" => Role::Link,
    "AXTextField" => match subrole {
      Some("AXSearchField") => Role::SearchField,
      _ => Role::TextField,
    },
    "AXTextArea" => Role::TextArea,
    "AXComboBox" => Role::ComboBox,
    "AXCheckBox" => Role::Checkbox,
    "AXSlider" => Role::Slider,
    "AXIncrementor" => Role::Stepper,
    "AXProgressIndicator" => Role::ProgressBar,
    "AXStaticText" => Role::StaticText,
    "AXImage" => Role::Image,
    "AXSplitter" | "AXSeparator" => Role::Separator,
    "AXStaticItem" => Role::ListItem,
    _ => Role::Unknown,
  }
}

/// Convert an action to its macOS action string.
pub(super) const fn action_to_macos(a: Action) -> &'static str {
  match a {
    Action::Press => "AXPress",
    Action::ShowMenu => "AXShowMenu",
    Action::Increment => "AXIncrement",
    Action::Decrement => "AXDecrement",
    Action::Confirm => "AXConfirm",
    Action::Cancel => "AXCancel",
    Action::Raise => "AXRaise",
  }
}

/// Convert a notification kind to its macOS notification string.
pub(super) const fn notification_to_macos(n: Notification) -> &'static str {
  match n {
    Notification::Created => "AXCreated",
    Notification::Destroyed => "AXUIElementDestroyed",
    Notification::ValueChanged => "AXValueChanged",
    Notification::TitleChanged => "AXTitleChanged",
    Notification::FocusChanged => "AXFocusedUIElementChanged",
    Notification::ChildrenChanged => "AXLayoutChanged",
  }
}
