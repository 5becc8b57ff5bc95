//! Minimal structural checks

use crate::error::{BvhError, Result};
use crate::numeric::lenient_usize;
use crate::tree::BvhTree;
use crate::{CHANNELS, END, FRAMES, JOINT, OFFSET, ROOT};

impl BvhTree {
    /// Reject trees the query engine cannot walk
    ///
    /// Empty input passes. Otherwise exactly one ROOT must exist, every ROOT/JOINT
    /// needs OFFSET and a well-formed CHANNELS line, and every End Site
    /// needs OFFSET. Frame rows that disagree with the channel total are
    /// only reported.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let roots = self.search(&[ROOT]);
        if roots.is_empty() {
            return Err(BvhError::MissingRoot);
        }
        if roots.len() > 1 {
            return Err(BvhError::MultipleRoots { count: roots.len() });
        }

        for id in roots.into_iter().chain(self.search(&[JOINT])) {
            let joint = self.node(id);
            let name = joint.name();

            if self.attribute(id, OFFSET).is_none() {
                return Err(missing(name, OFFSET));
            }

            let channels = self
                .attribute(id, CHANNELS)
                .ok_or_else(|| missing(name, CHANNELS))?;
            let count = &channels[0];
            let declared = count.parse::<usize>().ok();
            if declared.is_none_or(|n| channels.len() - 1 < n) {
                return Err(BvhError::InvalidChannelCount {
                    joint: name.to_string(),
                    value: count.clone(),
                });
            }
        }

        for id in self.search(&[END]) {
            if self.attribute(id, OFFSET).is_none() {
                let parent = self.node(id).parent.map(|p| self.node(p).name()).unwrap_or("");
                return Err(missing(&format!("{} End Site", parent), OFFSET));
            }
        }

        self.report_frame_mismatches();
        Ok(())
    }

    fn report_frame_mismatches(&self) {
        let expected = self.channel_count();
        let mismatched = self.frames.iter().filter(|row| row.len() != expected).count();
        if mismatched > 0 {
            tracing::warn!(
                "{} of {} frame rows do not have {} channel values",
                mismatched,
                self.frames.len(),
                expected
            );
        }

        if let Some(header) = self.search(&[FRAMES]).first() {
            let declared = self.node(*header).fields.get(1).map(|s| lenient_usize(s));
            if declared != Some(self.frames.len()) {
                tracing::warn!(
                    "Frames header declares {:?} frames but {} rows were read",
                    declared,
                    self.frames.len()
                );
            }
        }
    }
}

fn missing(joint: &str, attribute: &'static str) -> BvhError {
    BvhError::MissingAttribute {
        joint: joint.to_string(),
        attribute,
    }
}
