/// Selection tracker for the gallery grid
///
/// The set is the only source of truth: tile highlighting and checkbox
/// state are rendered from it, never stored separately.

/// Unique filenames in the order the user selected them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<String>,
}

impl Selection {
    /// Flip membership of `filename` and return the new state
    pub fn toggle(&mut self, filename: &str) -> bool {
        let selected = !self.contains(filename);
        self.set(filename, selected);
        selected
    }

    /// Force membership of `filename` to `selected`
    pub fn set(&mut self, filename: &str, selected: bool) {
        match (selected, self.position(filename)) {
            (true, None) => self.order.push(filename.to_string()),
            (false, Some(index)) => {
                self.order.remove(index);
            }
            _ => {}
        }
    }

    /// Add every filename; already selected entries keep their position
    pub fn select_all<'a>(&mut self, filenames: impl IntoIterator<Item = &'a str>) {
        for filename in filenames {
            self.set(filename, true);
        }
    }

    /// Remove every listed filename
    pub fn deselect_all<'a>(&mut self, filenames: impl IntoIterator<Item = &'a str>) {
        for filename in filenames {
            self.set(filename, false);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.position(filename).is_some()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected filenames in insertion order
    pub fn filenames(&self) -> &[String] {
        &self.order
    }

    /// Text for the counter next to the gallery controls
    pub fn label(&self) -> String {
        format!("{} selected", self.len())
    }

    fn position(&self, filename: &str) -> Option<usize> {
        self.order.iter().position(|f| f == filename)
    }
}
