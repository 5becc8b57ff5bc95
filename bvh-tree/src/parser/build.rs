//! Brace-scoped tree construction

use crate::error::{BvhError, Result};
use crate::node::{Node, NodeId};
use crate::tokenizer::TokenLine;
use crate::{CLOSE, FRAME_TIME, OPEN};

/// Node arena and frame rows produced from one token stream
pub(crate) struct BuiltTree {
    pub nodes: Vec<Node>,
    pub frames: Vec<Vec<String>>,
}

/// Build the hierarchy from tokenized lines
///
/// A stack of open parents starts at the synthetic root. `{` pushes the
/// most recently created node, `}` pops, any other line becomes a child of
/// the top of the stack. Once the `Frame Time:` line has been attached,
/// every following line is kept verbatim as a frame row.
pub(crate) fn build_tree(lines: Vec<TokenLine>) -> Result<BuiltTree> {
    let mut nodes = vec![Node::default()];
    let mut stack = vec![NodeId::ROOT];
    let mut last_created: Option<NodeId> = None;
    let mut frames = Vec::new();
    let mut in_motion = false;

    for TokenLine { line, fields } in lines {
        if in_motion {
            frames.push(fields);
            continue;
        }

        match fields[0].as_str() {
            OPEN => {
                let node = last_created.ok_or(BvhError::OrphanOpen { line })?;
                stack.push(node);
            }
            CLOSE => {
                if stack.len() <= 1 {
                    return Err(BvhError::UnexpectedClose { line });
                }
                stack.pop();
            }
            _ => {
                in_motion = is_frame_time(&fields);

                // The stack is never empty: the synthetic root is never popped
                let parent = stack[stack.len() - 1];
                let id = NodeId(nodes.len());
                nodes.push(Node::new(fields, parent, line));
                nodes[parent.0].children.push(id);
                last_created = Some(id);
            }
        }
    }

    if stack.len() > 1 {
        return Err(BvhError::UnclosedScope {
            depth: stack.len() - 1,
        });
    }

    Ok(BuiltTree { nodes, frames })
}

fn is_frame_time(fields: &[String]) -> bool {
    fields.len() >= FRAME_TIME.len() && fields.iter().zip(FRAME_TIME).all(|(f, k)| f == k)
}
