use std::collections::BTreeMap;

pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send>;

/// An ordered collection with composable named visibility predicates.
///
/// `originals` is the canonical, order-defining sequence; the visible
/// subset is tracked as indices into it, so recomputation can never
/// reorder retained items and running it twice is a no-op.
pub struct FilterableList<T> {
    originals: Vec<T>,
    visible: Vec<usize>,
    filters: BTreeMap<String, Predicate<T>>,
}

impl<T> Default for FilterableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FilterableList<T> {
    pub fn new() -> Self {
        Self {
            originals: Vec::new(),
            visible: Vec::new(),
            filters: BTreeMap::new(),
        }
    }

    /// False until the first `set_originals` with actual content. Contexts
    /// use this to let keypresses fall through while data is still loading.
    pub fn initialized(&self) -> bool {
        !self.originals.is_empty()
    }

    /// Replace the canonical sequence wholesale and refilter.
    pub fn set_originals(&mut self, items: Vec<T>) {
        self.originals = items;
        self.filter_results();
    }

    pub fn originals(&self) -> &[T] {
        &self.originals
    }

    /// Swap out the canonical rows, handing back the previous ones.
    /// The help context uses this to stash the package rows while it
    /// shows its generated table.
    pub fn swap_originals(&mut self, items: Vec<T>) -> Vec<T> {
        let previous = std::mem::replace(&mut self.originals, items);
        self.filter_results();
        previous
    }

    /// Install a named predicate. Replaces any previous predicate with the
    /// same name. Does not refilter; callers batch edits and then call
    /// `filter_results` once.
    pub fn add_filter(&mut self, name: &str, predicate: Predicate<T>) {
        self.filters.insert(name.to_string(), predicate);
    }

    /// Uninstall a named predicate, returning it so a caller can implement
    /// a toggle without tracking extra state.
    pub fn remove_filter(&mut self, name: &str) -> Option<Predicate<T>> {
        self.filters.remove(name)
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Remove every installed predicate, handing the set back so it can
    /// be reinstated later. Generated views (the help table) use this to
    /// suspend filtering while they own the rows. Does not refilter.
    pub fn take_filters(&mut self) -> BTreeMap<String, Predicate<T>> {
        std::mem::take(&mut self.filters)
    }

    /// Reinstate a previously taken predicate set. Does not refilter.
    pub fn restore_filters(&mut self, filters: BTreeMap<String, Predicate<T>>) {
        self.filters = filters;
    }

    /// Recompute the visible subset: exactly the originals on which every
    /// installed predicate agrees, in original order.
    pub fn filter_results(&mut self) {
        let filters = &self.filters;
        let visible = self
            .originals
            .iter()
            .enumerate()
            .filter(|(_, item)| filters.values().all(|accept| accept(item)))
            .map(|(index, _)| index)
            .collect();
        self.visible = visible;
    }

    /// The currently visible items, a stable-order sub-sequence of
    /// `originals`.
    pub fn reference(&self) -> impl Iterator<Item = &T> {
        self.visible.iter().map(|&index| &self.originals[index])
    }

    /// Visible item at ordinal position `position`.
    pub fn get(&self, position: usize) -> Option<&T> {
        self.visible
            .get(position)
            .map(|&index| &self.originals[index])
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

/// Pattern buffer for incremental search. Pure state; the owner decides
/// when to recompile the predicate and refilter.
#[derive(Debug, Default)]
pub struct SearchInput {
    accepting: bool,
    pattern: String,
}

impl SearchInput {
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Start accepting keystrokes with an empty pattern.
    pub fn begin(&mut self) {
        self.accepting = true;
        self.pattern.clear();
    }

    /// Stop accepting keystrokes and forget the pattern.
    pub fn end(&mut self) {
        self.accepting = false;
        self.pattern.clear();
    }

    pub fn push(&mut self, c: char) {
        self.pattern.push(c);
    }

    /// Remove the last character. Returns false when there was nothing
    /// left to remove, which the searchable mixin treats as "close the
    /// search".
    pub fn backspace(&mut self) -> bool {
        self.pattern.pop().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &FilterableList<String>) -> Vec<&str> {
        list.reference().map(String::as_str).collect()
    }

    fn sample() -> FilterableList<String> {
        let mut list = FilterableList::new();
        list.set_originals(vec![
            "alpha".to_string(),
            "bravo".to_string(),
            "charlie".to_string(),
            "delta".to_string(),
        ]);
        list
    }

    #[test]
    fn no_filters_shows_everything_in_order() {
        let list = sample();
        assert_eq!(names(&list), vec!["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn conjunction_of_filters_preserves_order() {
        let mut list = sample();
        list.add_filter("has_a", Box::new(|s: &String| s.contains('a')));
        list.add_filter("long", Box::new(|s: &String| s.len() > 4));
        list.filter_results();
        assert_eq!(names(&list), vec!["alpha", "bravo", "charlie", "delta"]);

        list.add_filter("has_l", Box::new(|s: &String| s.contains('l')));
        list.filter_results();
        assert_eq!(names(&list), vec!["alpha", "charlie", "delta"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let mut list = sample();
        list.add_filter("has_r", Box::new(|s: &String| s.contains('r')));
        list.filter_results();
        let first: Vec<String> = list.reference().cloned().collect();
        list.filter_results();
        let second: Vec<String> = list.reference().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn remove_filter_returns_the_predicate() {
        let mut list = sample();
        list.add_filter("has_r", Box::new(|s: &String| s.contains('r')));
        list.filter_results();
        assert_eq!(names(&list), vec!["bravo", "charlie"]);

        let predicate = list.remove_filter("has_r");
        assert!(predicate.is_some());
        assert!(list.remove_filter("has_r").is_none());
        list.filter_results();
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn swap_originals_hands_back_the_previous_rows() {
        let mut list = sample();
        let previous = list.swap_originals(vec!["echo".to_string()]);
        assert_eq!(previous.len(), 4);
        assert_eq!(names(&list), vec!["echo"]);
    }

    #[test]
    fn search_input_backspace_reports_exhaustion() {
        let mut input = SearchInput::default();
        input.begin();
        input.push('a');
        assert!(input.backspace());
        assert!(!input.backspace());
        assert!(input.is_accepting());
        input.end();
        assert!(!input.is_accepting());
    }
}
