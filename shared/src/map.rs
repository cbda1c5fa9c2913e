//! Map topology: which integer cells of a named map can be stood on, plus the
//! single-step movement helpers hunters use to walk across them.

use crate::Position;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

pub const DEFAULT_MAP_WIDTH: i32 = 40;
pub const DEFAULT_MAP_HEIGHT: i32 = 40;

/// Inclusive range of coordinates used when sampling hunter spawn points.
pub const SPAWN_MIN: i32 = 2;
pub const SPAWN_MAX: i32 = 36;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Answers traversability queries for named maps.
pub trait MapTopology {
    fn is_traversable(&self, map: &str, x: i32, y: i32) -> bool;
}

/// Rectangular grid with a set of blocked cells. Anything outside
/// `0..width` x `0..height` is never traversable.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    width: i32,
    height: i32,
    blocked: HashSet<(i32, i32)>,
}

impl GridMap {
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocked: HashSet::new(),
        }
    }

    /// Parses an ASCII layout: one row per line, `#` marks a blocked cell and
    /// any other character is open. Width is the longest row.
    pub fn from_layout(layout: &str) -> Self {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();

        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut map = GridMap::open(width, rows.len() as i32);

        for (y, row) in rows.iter().enumerate() {
            for (x, cell) in row.chars().enumerate() {
                if cell == '#' {
                    map.blocked.insert((x as i32, y as i32));
                }
            }
        }
        map
    }

    /// Blocks the whole outer ring of the grid.
    pub fn with_border(mut self) -> Self {
        for x in 0..self.width {
            self.blocked.insert((x, 0));
            self.blocked.insert((x, self.height - 1));
        }
        for y in 0..self.height {
            self.blocked.insert((0, y));
            self.blocked.insert((self.width - 1, y));
        }
        self
    }

    /// Blocks every cell in the inclusive rectangle `(x0, y0)..=(x1, y1)`.
    pub fn with_block(mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.blocked.insert((x, y));
            }
        }
        self
    }

    /// Cafeteria floor: walled room, a serving counter along the top and four
    /// rows of tables with aisles between them.
    pub fn cafeteria() -> Self {
        let mut map = GridMap::open(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)
            .with_border()
            .with_block(8, 4, 31, 4);
        for row in [10, 17, 24, 31] {
            for col in [5, 15, 25] {
                map = map.with_block(col, row, col + 6, row + 1);
            }
        }
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && !self.blocked.contains(&(x, y))
    }
}

/// Named maps known to the hub. Unknown names resolve to an open grid of the
/// default size.
#[derive(Debug, Clone)]
pub struct MapCatalog {
    maps: HashMap<String, GridMap>,
    fallback: GridMap,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self {
            maps: HashMap::new(),
            fallback: GridMap::open(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT),
        }
    }

    /// Catalog preloaded with the maps shipped with the hub.
    pub fn with_builtin() -> Self {
        let mut catalog = MapCatalog::new();
        catalog.insert(crate::DEFAULT_SESSION_MAP, GridMap::cafeteria());
        catalog
    }

    /// Adds every `*.map` layout file in `dir` on top of the built-in maps.
    /// The file stem becomes the map name.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut catalog = MapCatalog::with_builtin();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("map") {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                let layout = fs::read_to_string(&path)?;
                catalog.insert(name, GridMap::from_layout(&layout));
            }
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, name: &str, map: GridMap) {
        self.maps.insert(name.to_string(), map);
    }

    pub fn get(&self, name: &str) -> &GridMap {
        self.maps.get(name).unwrap_or(&self.fallback)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl MapTopology for MapCatalog {
    fn is_traversable(&self, map: &str, x: i32, y: i32) -> bool {
        self.get(map).is_traversable(x, y)
    }
}

fn cell(position: Position) -> (i32, i32) {
    (position.x.round() as i32, position.y.round() as i32)
}

/// One unit step from `from` toward `target` on each axis. Returns `from`
/// unchanged when the destination cell is not traversable or the target is
/// already reached.
pub fn step_toward<T: MapTopology + ?Sized>(
    topology: &T,
    map: &str,
    from: Position,
    target: Position,
) -> Position {
    let (x, y) = cell(from);
    let (tx, ty) = cell(target);
    let next = (x + (tx - x).signum(), y + (ty - y).signum());

    if next == (x, y) || !topology.is_traversable(map, next.0, next.1) {
        return from;
    }
    Position::new(next.0 as f64, next.1 as f64)
}

/// Moves to a uniformly chosen traversable neighbour, or stays put when
/// boxed in.
pub fn random_step<T: MapTopology + ?Sized, R: Rng + ?Sized>(
    topology: &T,
    map: &str,
    from: Position,
    rng: &mut R,
) -> Position {
    let (x, y) = cell(from);
    let candidates: Vec<(i32, i32)> = NEIGHBOURS
        .iter()
        .map(|(dx, dy)| (x + dx, y + dy))
        .filter(|(nx, ny)| topology.is_traversable(map, *nx, *ny))
        .collect();

    match candidates.choose(rng) {
        Some((nx, ny)) => Position::new(*nx as f64, *ny as f64),
        None => from,
    }
}

/// Random spawn cell inside the map interior, accepted only if traversable.
/// Gives up after `attempts` draws and returns `fallback`.
pub fn find_spawn<T: MapTopology + ?Sized, R: Rng + ?Sized>(
    topology: &T,
    map: &str,
    rng: &mut R,
    attempts: u32,
    fallback: Position,
) -> Position {
    for _ in 0..attempts {
        let x = rng.gen_range(SPAWN_MIN..=SPAWN_MAX);
        let y = rng.gen_range(SPAWN_MIN..=SPAWN_MAX);
        if topology.is_traversable(map, x, y) {
            return Position::new(x as f64, y as f64);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Topology where nothing is walkable.
    struct Solid;

    impl MapTopology for Solid {
        fn is_traversable(&self, _map: &str, _x: i32, _y: i32) -> bool {
            false
        }
    }

    #[test]
    fn test_layout_parsing() {
        let map = GridMap::from_layout("#####\n#...#\n#.#.#\n#####\n");
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 4);
        assert!(map.is_traversable(1, 1));
        assert!(!map.is_traversable(2, 2));
        assert!(!map.is_traversable(0, 0));
        assert!(!map.is_traversable(7, 1));
        assert!(!map.is_traversable(-1, 1));
    }

    #[test]
    fn test_cafeteria_layout() {
        let map = GridMap::cafeteria();
        assert!(!map.is_traversable(0, 5));
        assert!(!map.is_traversable(10, 4));
        assert!(!map.is_traversable(6, 11));
        assert!(map.is_traversable(1, 1));
        assert!(map.is_traversable(20, 15));
    }

    #[test]
    fn test_catalog_fallback_is_open() {
        let catalog = MapCatalog::with_builtin();
        assert!(catalog.is_traversable("unknown", 0, 0));
        assert!(catalog.is_traversable("unknown", 39, 39));
        assert!(!catalog.is_traversable("unknown", 40, 0));
        assert!(!catalog.is_traversable(crate::DEFAULT_SESSION_MAP, 0, 0));
        assert_eq!(catalog.names(), vec![crate::DEFAULT_SESSION_MAP]);
    }

    #[test]
    fn test_load_dir_reads_map_files() {
        let dir = std::env::temp_dir().join(format!("pursuit-maps-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lab.map"), "####\n#..#\n####\n").unwrap();
        fs::write(dir.join("notes.txt"), "not a map").unwrap();

        let catalog = MapCatalog::load_dir(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(catalog.names(), vec![crate::DEFAULT_SESSION_MAP, "lab"]);
        assert!(catalog.is_traversable("lab", 1, 1));
        assert!(!catalog.is_traversable("lab", 3, 1));
        assert!(MapCatalog::load_dir(&dir).is_err());
    }

    #[test]
    fn test_step_toward_moves_one_unit() {
        let catalog = MapCatalog::new();
        let next = step_toward(&catalog, "arena", Position::new(0.0, 0.0), Position::new(1.0, 0.0));
        assert_eq!(next, Position::new(1.0, 0.0));

        let next = step_toward(&catalog, "arena", Position::new(5.0, 5.0), Position::new(1.0, 9.0));
        assert_eq!(next, Position::new(4.0, 6.0));
    }

    #[test]
    fn test_step_toward_blocked_is_suppressed() {
        let mut catalog = MapCatalog::new();
        catalog.insert("walled", GridMap::open(10, 10).with_block(3, 3, 3, 3));
        let from = Position::new(2.0, 2.0);
        let next = step_toward(&catalog, "walled", from, Position::new(8.0, 8.0));
        assert_eq!(next, from);
    }

    #[test]
    fn test_step_toward_on_target_stays() {
        let catalog = MapCatalog::new();
        let from = Position::new(4.0, 4.0);
        assert_eq!(step_toward(&catalog, "arena", from, Position::new(4.2, 3.9)), from);
    }

    #[test]
    fn test_random_step_stays_traversable() {
        let catalog = MapCatalog::with_builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let mut position = Position::new(1.0, 1.0);
        for _ in 0..200 {
            position = random_step(&catalog, crate::DEFAULT_SESSION_MAP, position, &mut rng);
            assert!(catalog.is_traversable(
                crate::DEFAULT_SESSION_MAP,
                position.x as i32,
                position.y as i32
            ));
        }
    }

    #[test]
    fn test_random_step_boxed_in() {
        let mut rng = StdRng::seed_from_u64(1);
        let from = Position::new(3.0, 3.0);
        assert_eq!(random_step(&Solid, "any", from, &mut rng), from);
    }

    #[test]
    fn test_find_spawn_within_interior() {
        let catalog = MapCatalog::with_builtin();
        let mut rng = StdRng::seed_from_u64(99);
        let fallback = Position::new(20.0, 15.0);
        for _ in 0..50 {
            let spawn = find_spawn(&catalog, crate::DEFAULT_SESSION_MAP, &mut rng, 100, fallback);
            assert!((SPAWN_MIN..=SPAWN_MAX).contains(&(spawn.x as i32)));
            assert!((SPAWN_MIN..=SPAWN_MAX).contains(&(spawn.y as i32)));
            assert!(catalog.is_traversable(
                crate::DEFAULT_SESSION_MAP,
                spawn.x as i32,
                spawn.y as i32
            ));
        }
    }

    #[test]
    fn test_find_spawn_falls_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let fallback = Position::new(20.0, 15.0);
        assert_eq!(find_spawn(&Solid, "any", &mut rng, 100, fallback), fallback);
    }
}
