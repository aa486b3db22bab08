use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{key, links, AvlTree, Node, NodeAllocator};

impl<K, V, C, A> AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    /// Writes the shape of the tree as a Graphviz digraph.
    ///
    /// Each node is labelled `key:height/balance`. Missing children of interior nodes are drawn as
    /// points, so the left/right placement of a lone child is visible.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        let Some(root) = self.root else {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        };

        enum Item<K, V> {
            Node(NonNull<Node<K, V>>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let (node_key, node_links) = unsafe { (key(node), links(node)) };
                let height = node_links.height();
                let balance = node_links.balance();
                write!(
                    w,
                    "\"graph{name}-{node_key}\" [label=\"{node_key}:{height}/{balance}\"]; "
                )?;

                if node_links.is_leaf() {
                    continue;
                }

                for child in [node_links.left(), node_links.right()] {
                    match child {
                        Some(child) => {
                            let child_key = unsafe { key(child) };
                            queue.push_back(Item::Node(child));
                            writeln!(
                                edges,
                                "\"graph{name}-{node_key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                edges,
                                "\"graph{name}-{node_key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use crate::AvlTree;

    #[test]
    fn dotgraph_labels_height_and_balance() {
        let mut tree = AvlTree::new();
        for key in [2, 1, 3, 4] {
            tree.insert(key, ());
        }

        let mut out = String::new();
        tree.dotgraph("t", &mut out).unwrap();

        assert!(out.starts_with("digraph \"graph-t\""));
        assert!(out.contains("[label=\"2:2/-1\"]"));
        assert!(out.contains("[label=\"3:1/-1\"]"));
        assert!(out.contains("[label=\"4:0/0\"]"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-1\";"));
        assert!(out.contains("\"grapht-3\" -> \"grapht-missing0\";"));
    }

    #[test]
    fn dotgraph_empty() {
        let tree: AvlTree<u32, ()> = AvlTree::new();
        let mut out = String::new();
        tree.dotgraph("e", &mut out).unwrap();
        assert_eq!(out, "digraph \"graph-e\" {}");
    }
}
