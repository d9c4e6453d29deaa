//! In-memory workbook: an ordered collection of worksheets.

use crate::error::{CodecError, CodecResult};
use crate::sheet::Worksheet;

/// Longest sheet name xlsx accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// An ordered set of worksheets.
///
/// Sheet lookup ignores ASCII case, as xlsx does: `Users` and `users`
/// name the same sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Creates a workbook with no sheets.
    #[must_use]
    pub const fn new() -> Self {
        Self { sheets: Vec::new() }
    }

    /// Returns `true` when the workbook holds no sheets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sheet names in workbook order.
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Worksheet::name).collect()
    }

    /// Iterates sheets in workbook order.
    pub fn sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    /// Finds a sheet by name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.position(name).map(|i| &self.sheets[i])
    }

    /// Finds a sheet by name for mutation.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.position(name).map(move |i| &mut self.sheets[i])
    }

    /// Appends a new empty sheet.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidSheetName`] if the name breaks xlsx
    /// rules and [`CodecError::DuplicateSheet`] if it is taken.
    pub fn add_sheet(&mut self, name: &str) -> CodecResult<&mut Worksheet> {
        validate_sheet_name(name)?;
        if self.position(name).is_some() {
            return Err(CodecError::DuplicateSheet {
                name: name.to_string(),
            });
        }
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    /// Appends an already populated sheet (used by the decoder).
    pub(crate) fn push_sheet(&mut self, sheet: Worksheet) -> CodecResult<()> {
        if self.position(sheet.name()).is_some() {
            return Err(CodecError::DuplicateSheet {
                name: sheet.name().to_string(),
            });
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Removes a sheet. Returns `false` if there was none by that name.
    pub fn remove_sheet(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.sheets.remove(i);
                true
            }
            None => false,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
    }
}

/// Checks a sheet name against the xlsx naming rules.
///
/// # Errors
///
/// Returns [`CodecError::InvalidSheetName`] describing the broken rule.
pub fn validate_sheet_name(name: &str) -> CodecResult<()> {
    let reject = |reason| {
        Err(CodecError::InvalidSheetName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return reject("name is longer than 31 characters");
    }
    if name.contains(FORBIDDEN_SHEET_CHARS) {
        return reject("name contains one of []:*?/\\");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return reject("name starts or ends with an apostrophe");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    #[test]
    fn add_and_find_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet("Users").unwrap();
        wb.add_sheet("Orders").unwrap();

        assert_eq!(wb.sheet_names(), vec!["Users", "Orders"]);
        assert!(wb.sheet("users").is_some());
        assert!(wb.sheet("Missing").is_none());
    }

    #[test]
    fn duplicate_names_rejected_ignoring_case() {
        let mut wb = Workbook::new();
        wb.add_sheet("Users").unwrap();
        assert!(matches!(
            wb.add_sheet("USERS"),
            Err(CodecError::DuplicateSheet { .. })
        ));
    }

    #[test]
    fn invalid_names_rejected() {
        let mut wb = Workbook::new();
        for name in ["", "a/b", "x[1]", "'quoted'", "this name is far too long for xlsx"] {
            assert!(
                matches!(wb.add_sheet(name), Err(CodecError::InvalidSheetName { .. })),
                "{name:?} should be rejected"
            );
        }
        assert!(wb.is_empty());
    }

    #[test]
    fn remove_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet("a").unwrap();
        assert!(wb.remove_sheet("A"));
        assert!(!wb.remove_sheet("a"));
        assert!(wb.is_empty());
    }

    #[test]
    fn sheet_mut_edits_in_place() {
        let mut wb = Workbook::new();
        wb.add_sheet("t").unwrap();
        wb.sheet_mut("t")
            .unwrap()
            .set(1, 1, CellValue::from("id"))
            .unwrap();
        assert_eq!(wb.sheet("t").unwrap().get(1, 1), &CellValue::from("id"));
    }
}
