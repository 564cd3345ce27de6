//! World layout: a rectangular grid of rooms
//!
//! The rooms have no walls between them; they only give the HUD a coarse
//! location and give wave spawns a reference frame.

use glam::Vec2;

use super::geometry::Aabb;
use crate::settings::WorldSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Room {
    pub col: u32,
    pub row: u32,
    pub bounds: Aabb,
}

#[derive(Debug, Clone)]
pub struct World {
    bounds: Aabb,
    room_size: Vec2,
    cols: u32,
    rows: u32,
}

impl World {
    pub fn new(settings: &WorldSettings) -> Self {
        let cols = settings.room_cols.max(1);
        let rows = settings.room_rows.max(1);
        let room_size = Vec2::new(settings.room_width.max(1.0), settings.room_height.max(1.0));
        let size = room_size * Vec2::new(cols as f32, rows as f32);
        log::debug!("World {}x{} rooms, {}x{} px", cols, rows, size.x, size.y);
        Self {
            bounds: Aabb::from_min_size(Vec2::ZERO, size),
            room_size,
            cols,
            rows,
        }
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn center(&self) -> Vec2 {
        self.bounds.center
    }

    pub fn room_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// Room containing `pos`; positions outside the world snap to the nearest room
    pub fn room_at(&self, pos: Vec2) -> Room {
        let cell = (pos / self.room_size).floor();
        let col = (cell.x.max(0.0) as u32).min(self.cols - 1);
        let row = (cell.y.max(0.0) as u32).min(self.rows - 1);
        self.room(col, row)
    }

    fn room(&self, col: u32, row: u32) -> Room {
        let min = self.room_size * Vec2::new(col as f32, row as f32);
        Room {
            col,
            row,
            bounds: Aabb::from_min_size(min, self.room_size),
        }
    }

    /// All rooms in row-major order
    pub fn rooms(&self) -> impl Iterator<Item = Room> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| self.room(col, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_world_is_three_by_three() {
        let world = World::new(&WorldSettings::default());
        assert_eq!(world.room_count(), 9);
        assert_eq!(world.rooms().count(), 9);
        assert_eq!(world.center(), Vec2::new(1920.0, 1080.0));
    }

    #[test]
    fn test_room_at() {
        let world = World::new(&WorldSettings::default());
        let room = world.room_at(Vec2::new(1300.0, 100.0));
        assert_eq!((room.col, room.row), (1, 0));
        assert!(room.bounds.contains_point(Vec2::new(1300.0, 100.0)));

        let outside = world.room_at(Vec2::new(-50.0, 99999.0));
        assert_eq!((outside.col, outside.row), (0, 2));
    }

    #[test]
    fn test_degenerate_grid_still_has_a_room() {
        let settings = WorldSettings {
            room_cols: 0,
            room_rows: 0,
            ..Default::default()
        };
        let world = World::new(&settings);
        assert_eq!(world.room_count(), 1);
    }
}
