//! Recursive algorithms over a topic forest.
//!
//! Every traversal is preorder and depth-first over `children` in stored
//! order. Ids are assumed unique within a forest; when they are not, each
//! function acts on the first match it reaches.

use crate::{Topic, TopicStatus};

/// Outcome of looking up a topic's parent.
///
/// A root topic and an unknown id are different answers: callers building
/// breadcrumbs or navigating "back" need to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParentLookup<'a> {
    /// The id belongs to a root topic of the forest.
    Root,
    /// The id belongs to a child of this topic.
    Parent(&'a Topic),
    /// No topic with the id exists in the forest.
    NotFound,
}

impl<'a> ParentLookup<'a> {
    /// The parent topic, if the lookup found one.
    pub fn parent(self) -> Option<&'a Topic> {
        match self {
            Self::Parent(topic) => Some(topic),
            Self::Root | Self::NotFound => None,
        }
    }
}

/// Root and sub-topic counts of a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForestStats {
    /// Number of root topics.
    pub topic_count: usize,
    /// Number of non-root topics at any depth.
    pub sub_topic_count: usize,
}

impl ForestStats {
    pub fn of(forest: &[Topic]) -> Self {
        let total = flatten(forest).len();
        Self {
            topic_count: forest.len(),
            sub_topic_count: total - forest.len(),
        }
    }

    /// Every topic in the forest, roots included.
    pub fn total(&self) -> usize {
        self.topic_count + self.sub_topic_count
    }
}

/// Returns the first topic with `id` at any depth.
pub fn find<'a>(id: &str, forest: &'a [Topic]) -> Option<&'a Topic> {
    for topic in forest {
        if topic.id == id {
            return Some(topic);
        }
        if let Some(found) = find(id, &topic.children) {
            return Some(found);
        }
    }
    None
}

/// Mutable counterpart of [`find`].
pub fn find_mut<'a>(id: &str, forest: &'a mut [Topic]) -> Option<&'a mut Topic> {
    for topic in forest.iter_mut() {
        if topic.id == id {
            return Some(topic);
        }
        if let Some(found) = find_mut(id, &mut topic.children) {
            return Some(found);
        }
    }
    None
}

/// Resolves the immediate parent of `id`.
pub fn find_parent<'a>(id: &str, forest: &'a [Topic]) -> ParentLookup<'a> {
    find_parent_in(id, forest, None)
}

fn find_parent_in<'a>(
    id: &str,
    list: &'a [Topic],
    parent: Option<&'a Topic>,
) -> ParentLookup<'a> {
    for topic in list {
        if topic.id == id {
            return parent.map_or(ParentLookup::Root, ParentLookup::Parent);
        }
        match find_parent_in(id, &topic.children, Some(topic)) {
            ParentLookup::NotFound => {}
            found => return found,
        }
    }
    ParentLookup::NotFound
}

/// Detaches the first topic with `id` (and its whole subtree) and returns it.
///
/// Each level's own sequence is searched before descending into children.
pub fn take_subtree(id: &str, forest: &mut Vec<Topic>) -> Option<Topic> {
    if let Some(index) = forest.iter().position(|t| t.id == id) {
        return Some(forest.remove(index));
    }
    forest
        .iter_mut()
        .find_map(|topic| take_subtree(id, &mut topic.children))
}

/// Removes the first topic with `id` together with its descendants.
///
/// Returns `false`, leaving the forest untouched, when the id is absent.
pub fn delete_subtree(id: &str, forest: &mut Vec<Topic>) -> bool {
    take_subtree(id, forest).is_some()
}

/// Ancestors of `id`, root first. Empty for roots and for unknown ids.
pub fn ancestors<'a>(id: &str, forest: &'a [Topic]) -> Vec<&'a Topic> {
    let mut chain = Vec::new();
    let mut current = id;
    while let ParentLookup::Parent(parent) = find_parent(current, forest) {
        chain.push(parent);
        current = &parent.id;
    }
    chain.reverse();
    chain
}

/// `"Root / Child / Leaf"` breadcrumb for `id`, or `None` when it is absent.
pub fn path(id: &str, forest: &[Topic]) -> Option<String> {
    let topic = find(id, forest)?;
    let titles: Vec<&str> = ancestors(id, forest)
        .into_iter()
        .chain(std::iter::once(topic))
        .map(|t| t.title.as_str())
        .collect();
    Some(titles.join(" / "))
}

/// Every topic in preorder, including the forest's roots.
pub fn flatten(forest: &[Topic]) -> Vec<&Topic> {
    let mut out = Vec::new();
    flatten_into(forest, &mut out);
    out
}

fn flatten_into<'a>(list: &'a [Topic], out: &mut Vec<&'a Topic>) {
    for topic in list {
        out.push(topic);
        flatten_into(&topic.children, out);
    }
}

/// Number of topics below `topic` at any depth.
pub fn count_descendants(topic: &Topic) -> usize {
    flatten(&topic.children).len()
}

/// Flattened forest restricted to one status; `None` keeps everything.
pub fn filter_by_status<'a>(forest: &'a [Topic], status: Option<&TopicStatus>) -> Vec<&'a Topic> {
    let all = flatten(forest);
    match status {
        None => all,
        Some(wanted) => all.into_iter().filter(|t| &t.status == wanted).collect(),
    }
}
