/// Which gestures the book network currently responds to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
	#[default]
	Viewing,
	NodeEdit,
	LinkEdit,
}

/// Settings panel controls that move between modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeToggle {
	/// Gear/save button: viewing enters node-edit, any edit mode returns to viewing.
	Edit,
	NodeEdit,
	LinkEdit,
}

impl EditMode {
	pub fn is_editing(self) -> bool {
		self != EditMode::Viewing
	}

	/// The mode gestures actually follow. Signed-out users only ever view.
	pub fn effective(self, signed_in: bool) -> EditMode {
		if signed_in { self } else { EditMode::Viewing }
	}

	/// Whether `toggle` is enabled from this mode.
	pub fn allows(self, toggle: ModeToggle, signed_in: bool) -> bool {
		if !signed_in {
			return false;
		}
		match toggle {
			ModeToggle::Edit => true,
			ModeToggle::NodeEdit => self == EditMode::LinkEdit,
			ModeToggle::LinkEdit => self == EditMode::NodeEdit,
		}
	}

	/// Next mode after pressing `toggle`; disabled toggles leave the mode unchanged.
	pub fn apply(self, toggle: ModeToggle, signed_in: bool) -> EditMode {
		if !self.allows(toggle, signed_in) {
			return self;
		}
		match toggle {
			ModeToggle::Edit if self.is_editing() => EditMode::Viewing,
			ModeToggle::Edit => EditMode::NodeEdit,
			ModeToggle::NodeEdit => EditMode::NodeEdit,
			ModeToggle::LinkEdit => EditMode::LinkEdit,
		}
	}
}
