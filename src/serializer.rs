// Serializer - entity graph to flat JSON
//
// Activity and Camper both own a list of signups, and every signup points back
// at its activity and camper. Walking that graph naively never ends, so each
// entity kind carries default exclusion rules that cut the back-edge, and every
// recursive call receives the rules scoped to the edge it descends into.

use crate::entities::{
    activity, camper, get_activity, get_camper, signup, signups_for_activity, signups_for_camper,
    Activity, Camper, Signup,
};
use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use serde_json::{json, Map, Value};

// ============================================================================
// GRAPH NODES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Activity(Activity),
    Camper(Camper),
    Signup(Signup),
}

/// What an edge leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Related {
    One(Node),
    Many(Vec<Node>),
}

impl Node {
    fn entity(&self) -> &'static str {
        match self {
            Node::Activity(_) => activity::ENTITY,
            Node::Camper(_) => camper::ENTITY,
            Node::Signup(_) => signup::ENTITY,
        }
    }

    /// Relationship names, in output order
    pub fn edges(&self) -> &'static [&'static str] {
        match self {
            Node::Activity(_) | Node::Camper(_) => &["signups"],
            Node::Signup(_) => &["activity", "camper"],
        }
    }

    /// Rules that always apply to this kind, on top of what the caller asks for.
    pub fn default_exclusions(&self) -> Exclusions {
        match self {
            Node::Activity(_) => Exclusions::parse(["signups.activity"]),
            Node::Camper(_) => Exclusions::parse(["signups.camper"]),
            Node::Signup(_) => Exclusions::parse(["activity.signups", "camper.signups"]),
        }
    }

    fn scalars(&self) -> Map<String, Value> {
        let value = match self {
            Node::Activity(a) => json!({
                "id": a.id,
                "name": a.name,
                "difficulty": a.difficulty,
            }),
            Node::Camper(c) => json!({
                "id": c.id,
                "name": c.name,
                "age": c.age,
            }),
            Node::Signup(s) => json!({
                "id": s.id,
                "time": s.time,
                "camper_id": s.camper_id,
                "activity_id": s.activity_id,
            }),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl From<Activity> for Node {
    fn from(activity: Activity) -> Self {
        Node::Activity(activity)
    }
}

impl From<Camper> for Node {
    fn from(camper: Camper) -> Self {
        Node::Camper(camper)
    }
}

impl From<Signup> for Node {
    fn from(signup: Signup) -> Self {
        Node::Signup(signup)
    }
}

// ============================================================================
// EXCLUSION RULES
// ============================================================================

/// Set of edge paths to skip, e.g. `signups` or `signups.camper`.
/// A one-segment path drops the edge at this level; longer paths are handed
/// down to the entity the first segment leads to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    paths: Vec<Vec<String>>,
}

impl Exclusions {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse dotted rules. A leading `-` is accepted and ignored.
    pub fn parse<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exclusions = Self::default();
        for rule in rules {
            exclusions.add(rule.as_ref());
        }
        exclusions
    }

    pub fn add(&mut self, rule: &str) {
        let path: Vec<String> = rule
            .trim_start_matches('-')
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if !path.is_empty() && !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn merge(&mut self, other: &Exclusions) {
        for path in &other.paths {
            if !self.paths.contains(path) {
                self.paths.push(path.clone());
            }
        }
    }

    pub fn excludes(&self, edge: &str) -> bool {
        self.paths.iter().any(|p| p.len() == 1 && p[0] == edge)
    }

    /// Rules that apply beneath `edge`, with the leading segment removed.
    pub fn descend(&self, edge: &str) -> Exclusions {
        Exclusions {
            paths: self
                .paths
                .iter()
                .filter(|p| p.len() > 1 && p[0] == edge)
                .map(|p| p[1..].to_vec())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// ============================================================================
// RELATION LOOKUP
// ============================================================================

/// Resolves the entity (or entities) on the far side of an edge.
pub trait Relations {
    fn related(&self, node: &Node, edge: &str) -> StoreResult<Related>;
}

impl Relations for Connection {
    fn related(&self, node: &Node, edge: &str) -> StoreResult<Related> {
        let related = match (node, edge) {
            (Node::Activity(a), "signups") => Related::Many(
                signups_for_activity(self, a.id)?
                    .into_iter()
                    .map(Node::from)
                    .collect(),
            ),
            (Node::Camper(c), "signups") => Related::Many(
                signups_for_camper(self, c.id)?
                    .into_iter()
                    .map(Node::from)
                    .collect(),
            ),
            (Node::Signup(s), "activity") => Related::One(get_activity(self, s.activity_id)?.into()),
            (Node::Signup(s), "camper") => Related::One(get_camper(self, s.camper_id)?.into()),
            _ => {
                return Err(StoreError::UnknownEdge {
                    entity: node.entity(),
                    edge: edge.to_string(),
                })
            }
        };
        Ok(related)
    }
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Serialize `node` with its default rules plus `rules`.
pub fn to_value<R>(graph: &R, node: &Node, rules: &Exclusions) -> StoreResult<Value>
where
    R: Relations + ?Sized,
{
    let mut effective = node.default_exclusions();
    effective.merge(rules);

    let mut map = node.scalars();

    for edge in node.edges() {
        if effective.excludes(edge) {
            continue;
        }

        let nested = effective.descend(edge);
        let value = match graph.related(node, edge)? {
            Related::One(child) => to_value(graph, &child, &nested)?,
            Related::Many(children) => Value::Array(
                children
                    .iter()
                    .map(|child| to_value(graph, child, &nested))
                    .collect::<StoreResult<Vec<_>>>()?,
            ),
        };
        map.insert(edge.to_string(), value);
    }

    Ok(Value::Object(map))
}

/// Serialize a list of nodes with the same rules.
pub fn to_values<R, I>(graph: &R, nodes: I, rules: &Exclusions) -> StoreResult<Value>
where
    R: Relations + ?Sized,
    I: IntoIterator<Item = Node>,
{
    let values = nodes
        .into_iter()
        .map(|node| to_value(graph, &node, rules))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Value::Array(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use crate::entities::{insert_activity, insert_camper, insert_signup};

    fn seeded() -> (Connection, Camper, Activity, Signup) {
        let conn = open_database(":memory:").unwrap();
        let camper = insert_camper(&conn, Some("Alex"), Some(12)).unwrap();
        let activity = insert_activity(&conn, Some("Archery"), Some(2)).unwrap();
        let signup = insert_signup(&conn, Some(camper.id), Some(activity.id), Some(9)).unwrap();
        (conn, camper, activity, signup)
    }

    #[test]
    fn test_exclusion_paths() {
        let rules = Exclusions::parse(["-signups", "signups.camper", "activity.signups"]);

        assert!(rules.excludes("signups"));
        assert!(!rules.excludes("camper"));

        let below = rules.descend("signups");
        assert!(below.excludes("camper"));
        assert!(below.descend("camper").is_empty());
        assert!(rules.descend("camper").is_empty());
    }

    #[test]
    fn test_camper_default_hides_back_reference() {
        let (conn, camper, activity, signup) = seeded();

        let value = to_value(&conn, &camper.clone().into(), &Exclusions::none()).unwrap();

        assert_eq!(
            value,
            json!({
                "id": camper.id,
                "name": "Alex",
                "age": 12,
                "signups": [{
                    "id": signup.id,
                    "time": 9,
                    "camper_id": camper.id,
                    "activity_id": activity.id,
                    "activity": {
                        "id": activity.id,
                        "name": "Archery",
                        "difficulty": 2,
                    },
                }],
            })
        );
    }

    #[test]
    fn test_list_override_drops_signups() {
        let (conn, camper, _, _) = seeded();

        let value = to_value(&conn, &camper.into(), &Exclusions::parse(["signups"])).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(!object.contains_key("signups"));
    }

    #[test]
    fn test_signup_nests_both_parents_without_collections() {
        let (conn, camper, activity, signup) = seeded();

        let value = to_value(&conn, &signup.into(), &Exclusions::none()).unwrap();

        assert_eq!(value["camper"], json!({"id": camper.id, "name": "Alex", "age": 12}));
        assert_eq!(
            value["activity"],
            json!({"id": activity.id, "name": "Archery", "difficulty": 2})
        );
        assert!(value["camper"].get("signups").is_none());
        assert!(value["activity"].get("signups").is_none());
    }

    #[test]
    fn test_activity_default_hides_back_reference() {
        let (conn, _, activity, _) = seeded();

        let value = to_value(&conn, &activity.into(), &Exclusions::none()).unwrap();

        let signups = value["signups"].as_array().unwrap();
        assert_eq!(signups.len(), 1);
        assert!(signups[0].get("activity").is_none());
        assert_eq!(signups[0]["camper"]["name"], "Alex");
        assert!(signups[0]["camper"].get("signups").is_none());
    }

    #[test]
    fn test_nested_override_trims_signup_branch() {
        let (conn, camper, _, signup) = seeded();

        let value = to_value(
            &conn,
            &camper.into(),
            &Exclusions::parse(["signups.activity"]),
        )
        .unwrap();

        // Default rule still drops the back-reference; the override drops the rest
        assert_eq!(
            value["signups"],
            json!([{
                "id": signup.id,
                "time": 9,
                "camper_id": signup.camper_id,
                "activity_id": signup.activity_id,
            }])
        );
    }

    #[test]
    fn test_unknown_edge_is_error() {
        let (conn, camper, _, _) = seeded();

        let err = conn.related(&camper.into(), "counselors").unwrap_err();
        assert!(matches!(err, StoreError::UnknownEdge { entity: "Camper", .. }));
        assert_eq!(err.to_string(), "Camper has no relationship counselors");
    }

    #[test]
    fn test_to_values_keeps_order() {
        let (conn, _, _, _) = seeded();
        insert_camper(&conn, Some("Jo"), Some(9)).unwrap();

        let campers = crate::entities::list_campers(&conn).unwrap();
        let value = to_values(
            &conn,
            campers.into_iter().map(Node::from),
            &Exclusions::parse(["signups"]),
        )
        .unwrap();

        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alex", "Jo"]);
    }
}
