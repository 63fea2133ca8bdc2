//! Hot-start snapshot persistence: save the routing state to disk and
//! restore it later as an initial condition, independent of the
//! project's own lifetime. Writes are atomic (temp file + rename) so a
//! crash mid-write never leaves a torn file on disk.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tempfile::NamedTempFile;

use crate::error::EngineError;
use crate::project::{Link, Node};

const HOTSTART_VERSION: u32 = 1;

/// A topology fingerprint: object counts plus the routing method in
/// use. Cheap to compute, good enough to reject a hot-start file saved
/// against a different network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyHash {
    pub node_count: u32,
    pub link_count: u32,
    pub routing_model: i32,
}

impl TopologyHash {
    pub fn of(nodes: &[Node], links: &[Link], routing_model: i32) -> Self {
        Self {
            node_count: nodes.len() as u32,
            link_count: links.len() as u32,
            routing_model,
        }
    }
}

/// Saves a complete snapshot of node and link routing state.
///
/// Writes to a temp file in the destination's directory and renames
/// into place on success, so a reader never observes a partially
/// written file.
pub fn save(path: &Path, nodes: &[Node], links: &[Link], topology: TopologyHash) -> Result<(), EngineError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        write_u32(&mut w, path, HOTSTART_VERSION)?;
        write_u32(&mut w, path, topology.node_count)?;
        write_u32(&mut w, path, topology.link_count)?;
        write_i32(&mut w, path, topology.routing_model)?;

        for node in nodes {
            write_f64(&mut w, path, node.depth)?;
            write_f64(&mut w, path, node.volume)?;
        }
        for link in links {
            write_f64(&mut w, path, link.flow)?;
            write_f64(&mut w, path, link.depth)?;
            write_f64(&mut w, path, link.setting)?;
        }
        w.flush().map_err(|e| EngineError::FileWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    tmp.persist(path).map_err(|e| EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.error.to_string(),
    })?;
    Ok(())
}

/// Loads a hot-start snapshot, validating the format version and the
/// topology fingerprint against the currently open project before
/// applying any state.
pub fn load(path: &Path, nodes: &mut [Node], links: &mut [Link], expected: TopologyHash) -> Result<(), EngineError> {
    let file = File::open(path).map_err(|e| EngineError::FileOpen {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut r = BufReader::new(file);

    let version = read_u32(&mut r, path)?;
    if version != HOTSTART_VERSION {
        return Err(EngineError::HotStartVersion {
            expected: HOTSTART_VERSION,
            found: version,
        });
    }

    let node_count = read_u32(&mut r, path)?;
    let link_count = read_u32(&mut r, path)?;
    let routing_model = read_i32(&mut r, path)?;
    let found = TopologyHash {
        node_count,
        link_count,
        routing_model,
    };
    if found != expected {
        return Err(EngineError::HotStartTopology);
    }

    for node in nodes.iter_mut() {
        node.depth = read_f64(&mut r, path)?;
        node.volume = read_f64(&mut r, path)?;
    }
    for link in links.iter_mut() {
        link.flow = read_f64(&mut r, path)?;
        link.depth = read_f64(&mut r, path)?;
        link.setting = read_f64(&mut r, path)?;
    }
    Ok(())
}

fn write_u32<W: Write>(w: &mut W, path: &Path, v: u32) -> Result<(), EngineError> {
    w.write_u32::<LittleEndian>(v).map_err(|e| EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_i32<W: Write>(w: &mut W, path: &Path, v: i32) -> Result<(), EngineError> {
    w.write_i32::<LittleEndian>(v).map_err(|e| EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_f64<W: Write>(w: &mut W, path: &Path, v: f64) -> Result<(), EngineError> {
    w.write_f64::<LittleEndian>(v).map_err(|e| EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_u32<R: Read>(r: &mut R, path: &Path) -> Result<u32, EngineError> {
    r.read_u32::<LittleEndian>().map_err(|e| EngineError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_i32<R: Read>(r: &mut R, path: &Path) -> Result<i32, EngineError> {
    r.read_i32::<LittleEndian>().map_err(|e| EngineError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read_f64<R: Read>(r: &mut R, path: &Path) -> Result<f64, EngineError> {
    r.read_f64::<LittleEndian>().map_err(|e| EngineError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LinkType, NodeType};

    #[test]
    fn round_trips_node_and_link_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.hsf");

        let mut nodes = vec![Node::new("a", NodeType::Junction)];
        nodes[0].depth = 1.25;
        nodes[0].volume = 500.0;
        let mut links = vec![Link::new("c", LinkType::Conduit, 0, 0)];
        links[0].flow = 3.5;

        let topo = TopologyHash::of(&nodes, &links, 2);
        save(&path, &nodes, &links, topo).unwrap();

        let mut restored_nodes = vec![Node::new("a", NodeType::Junction)];
        let mut restored_links = vec![Link::new("c", LinkType::Conduit, 0, 0)];
        load(&path, &mut restored_nodes, &mut restored_links, topo).unwrap();

        assert_eq!(restored_nodes[0].depth, 1.25);
        assert_eq!(restored_nodes[0].volume, 500.0);
        assert_eq!(restored_links[0].flow, 3.5);
    }

    #[test]
    fn topology_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.hsf");
        let nodes = vec![Node::new("a", NodeType::Junction)];
        let links = vec![Link::new("c", LinkType::Conduit, 0, 0)];
        let topo = TopologyHash::of(&nodes, &links, 2);
        save(&path, &nodes, &links, topo).unwrap();

        let mut other_nodes = vec![Node::new("a", NodeType::Junction), Node::new("b", NodeType::Junction)];
        let mut other_links = vec![Link::new("c", LinkType::Conduit, 0, 0)];
        let wrong_topo = TopologyHash::of(&other_nodes, &other_links, 2);
        let err = load(&path, &mut other_nodes, &mut other_links, wrong_topo).unwrap_err();
        assert_eq!(err, EngineError::HotStartTopology);
    }
}
