//! Stable wire schema for a world's body population, plus the canonical
//! textual encoding: a nested, brace-grouped, comma-separated list
//! literal containing nothing but numbers. Encoding is stable, so
//! decode(encode(s)) == s and re-encoding yields the same bytes.

use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;
use crate::objects::body::BodyType;
use crate::shapes::{Circle, Polygon, Rectangle, Shape};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Shape payload of a body record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeData {
    None,
    Circle(f64),
    Rectangle(f64, f64),
    Polygon(Vec<(f64, f64)>),
}

impl ShapeData {
    fn tag(&self) -> u8 {
        match self {
            ShapeData::None => 0,
            ShapeData::Circle(_) => 1,
            ShapeData::Rectangle(..) => 2,
            ShapeData::Polygon(_) => 3,
        }
    }

    pub fn from_shape(shape: &Shape) -> Self {
        match shape {
            Shape::None => ShapeData::None,
            Shape::Circle(c) => ShapeData::Circle(c.radius),
            Shape::Rectangle(r) => ShapeData::Rectangle(r.width, r.height),
            Shape::Polygon(p) => {
                ShapeData::Polygon(p.vertices.iter().map(|v| (v.x, v.y)).collect())
            }
        }
    }

    pub fn to_shape(&self) -> Shape {
        match self {
            ShapeData::None => Shape::None,
            ShapeData::Circle(radius) => Shape::Circle(Circle::new(*radius)),
            ShapeData::Rectangle(w, h) => Shape::Rectangle(Rectangle::new(*w, *h)),
            ShapeData::Polygon(points) => Shape::Polygon(Polygon::new(
                points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            )),
        }
    }
}

/// One body's persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub id: u64,
    pub body_type: BodyType,
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
    pub rotation: f64,
    pub angular_velocity: f64,
    pub material: u32,
    pub shape: ShapeData,
}

/// A world's persisted state: the id watermark plus body records in
/// world iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub latest_body_id: u64,
    pub bodies: Vec<BodyRecord>,
}

fn body_type_code(body_type: BodyType) -> u8 {
    match body_type {
        BodyType::Static => 1,
        BodyType::Kinematic => 2,
        BodyType::Dynamic => 3,
    }
}

fn body_type_from_code(code: f64) -> Result<BodyType> {
    match code as i64 {
        1 => Ok(BodyType::Static),
        2 => Ok(BodyType::Kinematic),
        3 => Ok(BodyType::Dynamic),
        other => Err(PhysicsError::bad_argument(
            1,
            "data",
            format!("unknown body type code {other}"),
        )),
    }
}

/// Encodes a snapshot into the canonical text form.
pub fn encode(snapshot: &WorldSnapshot) -> String {
    let mut out = String::new();
    out.push('{');
    let _ = write!(out, "{}", snapshot.latest_body_id);
    out.push_str(",{");
    for (i, record) in snapshot.bodies.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_record(&mut out, record);
    }
    out.push_str("}}");
    out
}

fn encode_record(out: &mut String, record: &BodyRecord) {
    let _ = write!(
        out,
        "{{{},{},{},{},{},{},{},{},{},{},",
        record.id,
        body_type_code(record.body_type),
        record.px,
        record.py,
        record.vx,
        record.vy,
        record.rotation,
        record.angular_velocity,
        record.material,
        record.shape.tag(),
    );
    match &record.shape {
        ShapeData::None => out.push('0'),
        ShapeData::Circle(radius) => {
            let _ = write!(out, "{radius}");
        }
        ShapeData::Rectangle(w, h) => {
            let _ = write!(out, "{{{w},{h}}}");
        }
        ShapeData::Polygon(points) => {
            out.push('{');
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{{{x},{y}}}");
            }
            out.push('}');
        }
    }
    out.push('}');
}

/// Decodes the canonical text form back into a snapshot.
pub fn decode(input: &str) -> Result<WorldSnapshot> {
    let node = parse_root(input)?;
    let items = node.as_list(2)?;
    let latest_body_id = items[0].as_number()? as u64;
    let records = items[1].as_any_list()?;

    let mut bodies = Vec::with_capacity(records.len());
    for record in records {
        bodies.push(decode_record(record)?);
    }
    Ok(WorldSnapshot {
        latest_body_id,
        bodies,
    })
}

fn decode_record(node: &Node) -> Result<BodyRecord> {
    let fields = node.as_list(11)?;
    let shape_tag = fields[9].as_number()? as i64;
    let shape = match shape_tag {
        0 => {
            fields[10].as_number()?;
            ShapeData::None
        }
        1 => ShapeData::Circle(fields[10].as_number()?),
        2 => {
            let dims = fields[10].as_list(2)?;
            ShapeData::Rectangle(dims[0].as_number()?, dims[1].as_number()?)
        }
        3 => {
            let points = fields[10].as_any_list()?;
            let mut vertices = Vec::with_capacity(points.len());
            for point in points {
                let pair = point.as_list(2)?;
                vertices.push((pair[0].as_number()?, pair[1].as_number()?));
            }
            ShapeData::Polygon(vertices)
        }
        other => {
            return Err(PhysicsError::bad_argument(
                1,
                "data",
                format!("unknown shape tag {other}"),
            ))
        }
    };

    Ok(BodyRecord {
        id: fields[0].as_number()? as u64,
        body_type: body_type_from_code(fields[1].as_number()?)?,
        px: fields[2].as_number()?,
        py: fields[3].as_number()?,
        vx: fields[4].as_number()?,
        vy: fields[5].as_number()?,
        rotation: fields[6].as_number()?,
        angular_velocity: fields[7].as_number()?,
        material: fields[8].as_number()? as u32,
        shape,
    })
}

// --- Minimal recursive-descent parser for the list-literal grammar ---

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    List(Vec<Node>),
}

impl Node {
    fn as_number(&self) -> Result<f64> {
        match self {
            Node::Number(n) => Ok(*n),
            Node::List(_) => Err(malformed("expected a number")),
        }
    }

    fn as_any_list(&self) -> Result<&[Node]> {
        match self {
            Node::List(items) => Ok(items),
            Node::Number(_) => Err(malformed("expected a list")),
        }
    }

    fn as_list(&self, len: usize) -> Result<&[Node]> {
        let items = self.as_any_list()?;
        if items.len() != len {
            return Err(malformed(format!(
                "expected {len} elements, found {}",
                items.len()
            )));
        }
        Ok(items)
    }
}

fn malformed(reason: impl Into<String>) -> PhysicsError {
    PhysicsError::bad_argument(1, "data", reason)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

fn parse_root(input: &str) -> Result<Node> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let node = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.bytes.len() {
        return Err(malformed("trailing characters after value"));
    }
    Ok(node)
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(malformed(format!(
                "expected '{}' at offset {}",
                byte as char, self.pos
            )))
        }
    }

    fn parse_value(&mut self) -> Result<Node> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.parse_list(),
            Some(_) => self.parse_number(),
            None => Err(malformed("unexpected end of input")),
        }
    }

    fn parse_list(&mut self) -> Result<Node> {
        self.expect(b'{')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node::List(items));
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Node::List(items));
                }
                _ => return Err(malformed(format!("expected ',' or '}}' at offset {}", self.pos))),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Node> {
        let start = self.pos;
        while self.peek().is_some_and(|b| {
            b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E')
        }) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(malformed(format!("expected a number at offset {start}")));
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .expect("number slice is ascii");
        let value: f64 = text
            .parse()
            .map_err(|_| malformed(format!("invalid number '{text}'")))?;
        Ok(Node::Number(value))
    }
}
