//! Text selection to annotation: `Idle -> Selecting -> MenuOpen -> Idle`.
//!
//! Pointer devices capture a character range; touch devices capture the
//! whole tapped verse. Both paths run through the same transitions.

use tracing::debug;

use crate::error::{ReaderError, Result};
use crate::model::{AnnotationKind, HighlightColor, NewAnnotation, Verse, VerseId};
use crate::panels::{Point, Size};

/// Gap kept between the annotation menu and the viewport edges
pub const MENU_MARGIN: i32 = 8;

/// A non-empty selection ready for the annotation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSelection {
    pub verse_id: VerseId,
    pub selected_text: String,
    pub anchor: Point,
}

/// One entry of the annotation type/color picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Highlight(HighlightColor),
    Note,
    Bookmark,
}

impl MenuOption {
    pub fn all() -> Vec<MenuOption> {
        HighlightColor::all()
            .iter()
            .copied()
            .map(MenuOption::Highlight)
            .chain([MenuOption::Note, MenuOption::Bookmark])
            .collect()
    }

    pub fn label(&self) -> String {
        match self {
            MenuOption::Highlight(color) => format!("{} ({})", color.label(), color.name()),
            MenuOption::Note => "Note".to_string(),
            MenuOption::Bookmark => "Bookmark".to_string(),
        }
    }
}

/// State of the open picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMenu {
    pub selection: CapturedSelection,
    pub options: Vec<MenuOption>,
    pub selected: usize,
    pub note_draft: String,
    /// Inline validation message shown next to the picker
    pub error: Option<String>,
}

impl AnnotationMenu {
    fn new(selection: CapturedSelection) -> Self {
        Self {
            selection,
            options: MenuOption::all(),
            selected: 0,
            note_draft: String::new(),
            error: None,
        }
    }

    pub fn current(&self) -> MenuOption {
        self.options[self.selected.min(self.options.len() - 1)]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.options.len();
    }

    pub fn select_prev(&mut self) {
        let len = self.options.len();
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    pub fn select(&mut self, option: MenuOption) {
        if let Some(index) = self.options.iter().position(|o| *o == option) {
            self.selected = index;
        }
    }

    fn build(&self) -> Result<NewAnnotation> {
        let verse_id = self.selection.verse_id;
        let note = Some(self.note_draft.clone());
        match self.current() {
            MenuOption::Highlight(color) => {
                NewAnnotation::new(verse_id, AnnotationKind::Highlight, Some(color), note)
            }
            MenuOption::Note => NewAnnotation::new(verse_id, AnnotationKind::Note, None, note),
            MenuOption::Bookmark => {
                NewAnnotation::new(verse_id, AnnotationKind::Bookmark, None, None)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting,
    MenuOpen(AnnotationMenu),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SelectionState::Idle
    }

    pub fn menu(&self) -> Option<&AnnotationMenu> {
        match &self.state {
            SelectionState::MenuOpen(menu) => Some(menu),
            _ => None,
        }
    }

    pub fn menu_mut(&mut self) -> Option<&mut AnnotationMenu> {
        match &mut self.state {
            SelectionState::MenuOpen(menu) => Some(menu),
            _ => None,
        }
    }

    /// Pointer pressed inside the reading pane. An open menu is dismissed
    /// first, as with an outside click.
    pub fn begin(&mut self) {
        if matches!(self.state, SelectionState::MenuOpen(_)) {
            debug!("annotation menu dismissed by new selection");
        }
        self.state = SelectionState::Selecting;
    }

    /// Selection finished. Empty text returns to `Idle`; anything else opens
    /// the menu. Returns whether the menu opened.
    pub fn capture(&mut self, selection: CapturedSelection) -> bool {
        if self.state != SelectionState::Selecting {
            return false;
        }
        if selection.selected_text.trim().is_empty() {
            self.state = SelectionState::Idle;
            return false;
        }
        self.state = SelectionState::MenuOpen(AnnotationMenu::new(selection));
        true
    }

    /// Touch path: a tap selects the whole verse
    pub fn tap_verse(&mut self, verse: &Verse, anchor: Point) -> bool {
        self.begin();
        self.capture(CapturedSelection {
            verse_id: verse.id,
            selected_text: verse.text.clone(),
            anchor,
        })
    }

    /// Commit the highlighted option. On a validation failure the menu stays
    /// open with its `error` set.
    pub fn commit(&mut self) -> Result<NewAnnotation> {
        let menu = self
            .menu_mut()
            .ok_or_else(|| ReaderError::validation("no annotation menu is open"))?;
        match menu.build() {
            Ok(new) => {
                self.state = SelectionState::Idle;
                Ok(new)
            }
            Err(err) => {
                menu.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Commit a specific option (a click on a color swatch)
    pub fn commit_option(&mut self, option: MenuOption) -> Result<NewAnnotation> {
        if let Some(menu) = self.menu_mut() {
            menu.select(option);
        }
        self.commit()
    }

    /// Outside click, escape or explicit close. Discards the selection.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.state = SelectionState::Idle;
        was_active
    }
}

/// Keep a menu of size `menu` anchored at `anchor` fully inside `viewport`
pub fn clamp_menu(anchor: Point, menu: Size, viewport: Size) -> Point {
    let clamp_axis = |pos: i32, extent: u32, bound: u32| {
        let max = bound as i32 - extent as i32 - MENU_MARGIN;
        if max < MENU_MARGIN {
            MENU_MARGIN.min(bound as i32)
        } else {
            pos.clamp(MENU_MARGIN, max)
        }
    };
    Point {
        x: clamp_axis(anchor.x, menu.width, viewport.width),
        y: clamp_axis(anchor.y, menu.height, viewport.height),
    }
}
