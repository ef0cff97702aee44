//! Minimal BVH reader, enough to check what the writer produced.

use crate::error::ParseError;

/// One joint as declared in the HIERARCHY section.
#[derive(Clone, Debug, PartialEq)]
pub struct BvhJoint {
    pub name: String,
    /// Index into [`BvhDocument::joints`]
    pub parent: Option<usize>,
    pub offset: [f64; 3],
    pub channels: Vec<String>,
    pub end_site: Option<[f64; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BvhDocument {
    /// Joints in declaration (depth-first) order
    pub joints: Vec<BvhJoint>,
    pub frame_time: f64,
    pub frames: Vec<Vec<f64>>,
}

impl BvhDocument {
    pub fn channel_count(&self) -> usize {
        self.joints.iter().map(|j| j.channels.len()).sum()
    }

    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 * self.frame_time
    }

    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut cursor = self.joints[index].parent;
        while let Some(p) = cursor {
            depth += 1;
            cursor = self.joints[p].parent;
        }
        depth
    }
}

struct Tokens<'a> {
    items: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let items = text
            .lines()
            .enumerate()
            .flat_map(|(n, line)| line.split_whitespace().map(move |t| (n + 1, t)))
            .collect();
        Self { items, pos: 0 }
    }

    fn next(&mut self, context: &'static str) -> Result<(usize, &'a str), ParseError> {
        let item = self
            .items
            .get(self.pos)
            .copied()
            .ok_or(ParseError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(item)
    }

    fn expect(&mut self, word: &str, context: &'static str) -> Result<usize, ParseError> {
        let (line, token) = self.next(context)?;
        if token != word {
            return Err(ParseError::Syntax {
                line,
                reason: format!("expected '{}', found '{}'", word, token),
            });
        }
        Ok(line)
    }

    fn number(&mut self, context: &'static str) -> Result<f64, ParseError> {
        let (line, token) = self.next(context)?;
        let value: f64 = token.parse().map_err(|_| ParseError::Syntax {
            line,
            reason: format!("invalid number '{}' in {}", token, context),
        })?;
        if !value.is_finite() {
            return Err(ParseError::Syntax {
                line,
                reason: format!("non-finite number '{}' in {}", token, context),
            });
        }
        Ok(value)
    }

    fn triple(&mut self, context: &'static str) -> Result<[f64; 3], ParseError> {
        Ok([self.number(context)?, self.number(context)?, self.number(context)?])
    }
}

/// Parse BVH text into its hierarchy and motion rows.
pub fn parse(text: &str) -> Result<BvhDocument, ParseError> {
    let mut tokens = Tokens::new(text);

    tokens.expect("HIERARCHY", "header")?;
    tokens.expect("ROOT", "root joint")?;
    let mut joints = Vec::new();
    read_joint(&mut tokens, &mut joints, None)?;

    tokens.expect("MOTION", "motion section")?;
    tokens.expect("Frames:", "frame count")?;
    let (line, count) = tokens.next("frame count")?;
    let frame_count: usize = count.parse().map_err(|_| ParseError::Syntax {
        line,
        reason: format!("invalid frame count '{}'", count),
    })?;
    tokens.expect("Frame", "frame time")?;
    tokens.expect("Time:", "frame time")?;
    let frame_time = tokens.number("frame time")?;
    if frame_time <= 0.0 {
        return Err(ParseError::Inconsistent(format!(
            "frame time must be positive, got {}",
            frame_time
        )));
    }

    let width: usize = joints.iter().map(|j| j.channels.len()).sum();
    let mut frames: Vec<Vec<f64>> = Vec::with_capacity(frame_count);
    let mut current_line = 0;
    while tokens.pos < tokens.items.len() {
        let (line, _) = tokens.items[tokens.pos];
        if line != current_line {
            check_row_width(frames.last(), width, current_line)?;
            frames.push(Vec::with_capacity(width));
            current_line = line;
        }
        let value = tokens.number("motion row")?;
        if let Some(row) = frames.last_mut() {
            row.push(value);
        }
    }
    check_row_width(frames.last(), width, current_line)?;

    if frames.len() != frame_count {
        return Err(ParseError::Inconsistent(format!(
            "header declares {} frames, found {}",
            frame_count,
            frames.len()
        )));
    }

    Ok(BvhDocument {
        joints,
        frame_time,
        frames,
    })
}

fn check_row_width(row: Option<&Vec<f64>>, width: usize, line: usize) -> Result<(), ParseError> {
    match row {
        Some(values) if values.len() != width => Err(ParseError::Syntax {
            line,
            reason: format!("motion row has {} values, hierarchy declares {} channels", values.len(), width),
        }),
        _ => Ok(()),
    }
}

/// Reads one joint body, starting at its name, through its closing brace.
fn read_joint(
    tokens: &mut Tokens,
    joints: &mut Vec<BvhJoint>,
    parent: Option<usize>,
) -> Result<(), ParseError> {
    let (_, name) = tokens.next("joint name")?;
    tokens.expect("{", "joint body")?;
    tokens.expect("OFFSET", "joint offset")?;
    let offset = tokens.triple("joint offset")?;

    tokens.expect("CHANNELS", "joint channels")?;
    let (line, count) = tokens.next("channel count")?;
    let count: usize = count.parse().map_err(|_| ParseError::Syntax {
        line,
        reason: format!("invalid channel count '{}'", count),
    })?;
    let mut channels = Vec::with_capacity(count);
    for _ in 0..count {
        channels.push(tokens.next("channel name")?.1.to_string());
    }

    let index = joints.len();
    joints.push(BvhJoint {
        name: name.to_string(),
        parent,
        offset,
        channels,
        end_site: None,
    });

    loop {
        let (line, token) = tokens.next("joint body")?;
        match token {
            "JOINT" => read_joint(tokens, joints, Some(index))?,
            "End" => {
                tokens.expect("Site", "end site")?;
                tokens.expect("{", "end site")?;
                tokens.expect("OFFSET", "end site")?;
                let end = tokens.triple("end site")?;
                tokens.expect("}", "end site")?;
                joints[index].end_site = Some(end);
            }
            "}" => return Ok(()),
            other => {
                return Err(ParseError::Syntax {
                    line,
                    reason: format!(
                        "unexpected '{}' in joint '{}' (unbalanced braces?)",
                        other, joints[index].name
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0.0 0.0 0.0
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Chest
  {
    OFFSET 0.0 0.2 0.0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0.0 0.1 0.0
    }
  }
  JOINT Leg
  {
    OFFSET 0.1 -0.4 0.0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0.0 -0.4 0.0
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.033333
0 1 0 0 0 0 1 2 3 4 5 6
0 1 0 0 0 0 1 2 3 4 5 6.5
";

    #[test]
    fn reads_hierarchy_and_motion() {
        let doc = parse(SMALL).unwrap();
        let names: Vec<_> = doc.joints.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["Hips", "Chest", "Leg"]);
        assert_eq!(doc.joints[2].parent, Some(0));
        assert_eq!(doc.joints[2].offset, [0.1, -0.4, 0.0]);
        assert_eq!(doc.joints[1].end_site, Some([0.0, 0.1, 0.0]));
        assert_eq!(doc.joints[0].end_site, None);
        assert_eq!(doc.channel_count(), 12);
        assert_eq!(doc.frames.len(), 2);
        assert_eq!(doc.frames[1][11], 6.5);
        assert_eq!(doc.depth(1), 1);
        assert!((doc.duration() - 0.066666).abs() < 1e-9);
    }

    #[test]
    fn missing_motion_section() {
        let text = SMALL.split("MOTION").next().unwrap();
        assert!(matches!(
            parse(text),
            Err(ParseError::UnexpectedEof { context: "motion section" })
        ));
    }

    #[test]
    fn unbalanced_braces() {
        let missing = SMALL.replacen("}\nMOTION", "MOTION", 1);
        assert!(matches!(parse(&missing), Err(ParseError::Syntax { line: 24, .. })));
        let extra = SMALL.replacen("}\nMOTION", "}\n}\nMOTION", 1);
        assert!(matches!(parse(&extra), Err(ParseError::Syntax { line: 25, .. })));
    }

    #[test]
    fn bad_number_reports_line() {
        let text = SMALL.replace("OFFSET 0.1 -0.4 0.0", "OFFSET 0.1 abc 0.0");
        match parse(&text) {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 17),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn short_row_is_rejected() {
        let text = SMALL.replace("5 6.5", "5");
        assert!(matches!(parse(&text), Err(ParseError::Syntax { line: 29, .. })));
    }

    #[test]
    fn frame_count_mismatch() {
        let text = SMALL.replace("Frames: 2", "Frames: 3");
        assert!(matches!(parse(&text), Err(ParseError::Inconsistent(_))));
    }
}
