//! Board model of a chase match.
//!
//! A [`GameState`] owns the grid, both player positions, the scores and the turn budget. It is
//! mutated only through [`GameState::apply_command`] (and [`GameState::set_forced_winner`] when a
//! match ends abnormally); everything else is a read-only query.
//!
//! Coordinates are `(row, col)`. Any coordinate outside the grid reads as [`Cell::Wall`], so the
//! board is surrounded by an implicit wall.

use std::fmt;

/// One of the two competing players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First player of every turn pair.
    Cool,
    /// Second player of every turn pair.
    Hot,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Side {
        match self {
            Side::Cool => Side::Hot,
            Side::Hot => Side::Cool,
        }
    }

    /// Single letter used by progress displays (`C` or `H`).
    pub fn letter(self) -> char {
        match self {
            Side::Cool => 'C',
            Side::Hot => 'H',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Cool => write!(f, "Cool"),
            Side::Hot => write!(f, "Hot"),
        }
    }
}

/// Terrain of a single cell. The discriminant is the digit used on the wire and in map text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Cell {
    /// Free cell.
    #[default]
    Empty = 0,
    /// Blocked cell. Also what every out-of-bounds coordinate reads as.
    Wall = 2,
    /// Collectible item, worth one point.
    Item = 3,
}

impl Cell {
    /// Parse a terrain digit (`0`, `2` or `3`).
    pub fn from_digit(digit: u8) -> Option<Cell> {
        match digit {
            0 => Some(Cell::Empty),
            2 => Some(Cell::Wall),
            3 => Some(Cell::Item),
            _ => None,
        }
    }

    /// Terrain digit of this cell.
    pub fn digit(self) -> u8 {
        self as u8
    }
}

/// Grid coordinate. May lie outside the grid (a player can walk off the board).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Row, growing downwards.
    pub row: i32,
    /// Column, growing rightwards.
    pub col: i32,
}

impl Position {
    /// Position at `(row, col)`.
    pub const fn new(row: i32, col: i32) -> Position {
        Position { row, col }
    }

    /// Position `steps` cells away in `direction`.
    pub fn step(self, direction: Direction, steps: i32) -> Position {
        let (dr, dc) = direction.delta();
        Position {
            row: self.row + dr * steps,
            col: self.col + dc * steps,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Direction component of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `u`, towards row 0.
    Up,
    /// `d`
    Down,
    /// `l`, towards column 0.
    Left,
    /// `r`
    Right,
}

impl Direction {
    /// `(row, col)` delta of one step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Parse the protocol character (`u`, `d`, `l`, `r`).
    pub fn from_char(c: char) -> Option<Direction> {
        match c {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }

    /// Protocol character of this direction.
    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        }
    }
}

/// Action component of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `w`: move one cell.
    Walk,
    /// `p`: put a wall on the adjacent cell.
    Put,
    /// `l`: look at the 3×3 area two cells away.
    Look,
    /// `s`: search the 9 cells in a straight line.
    Search,
}

impl Action {
    /// Parse the protocol character (`w`, `p`, `l`, `s`).
    pub fn from_char(c: char) -> Option<Action> {
        match c {
            'w' => Some(Action::Walk),
            'p' => Some(Action::Put),
            'l' => Some(Action::Look),
            's' => Some(Action::Search),
            _ => None,
        }
    }

    /// Protocol character of this action.
    pub fn letter(self) -> char {
        match self {
            Action::Walk => 'w',
            Action::Put => 'p',
            Action::Look => 'l',
            Action::Search => 's',
        }
    }
}

/// A validated player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// What to do.
    pub action: Action,
    /// Where to do it.
    pub direction: Direction,
    /// Do not update the board highlight for look/search.
    pub suppress_hint: bool,
}

impl Command {
    /// Command with the board highlight enabled.
    pub const fn new(action: Action, direction: Direction) -> Command {
        Command {
            action,
            direction,
            suppress_hint: false,
        }
    }
}

/// Wire token, e.g. `wr` or `sun`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action.letter(), self.direction.letter())?;
        if self.suppress_hint {
            write!(f, "n")?;
        }
        Ok(())
    }
}

/// Response sent to a player: a game-over flag followed by 9 surveyed cells.
///
/// Cell digits are terrain digits, except `1` which marks the opponent's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vision {
    decided: bool,
    cells: [u8; 9],
}

impl Vision {
    /// Number of characters of the wire form.
    pub const LEN: usize = 10;

    /// True if the match already has a winner (`0` flag on the wire).
    pub fn is_decided(&self) -> bool {
        self.decided
    }

    /// Parse the wire form. `None` unless it is a `0`/`1` flag followed by 9 digits in `0..=3`.
    pub fn parse(token: &str) -> Option<Vision> {
        let bytes = token.as_bytes();
        if bytes.len() != Self::LEN {
            return None;
        }
        let decided = match bytes[0] {
            b'0' => true,
            b'1' => false,
            _ => return None,
        };
        let mut cells = [0; 9];
        for (cell, &b) in cells.iter_mut().zip(&bytes[1..]) {
            if !(b'0'..=b'3').contains(&b) {
                return None;
            }
            *cell = b - b'0';
        }
        Some(Vision { decided, cells })
    }

    /// Surveyed cell digits, in survey order. Row by row for a 3×3 area, so index 4 is the
    /// center and 1, 3, 5, 7 are its up, left, right and down neighbors.
    pub fn cells(&self) -> &[u8; 9] {
        &self.cells
    }

    /// Same cells, with the game-over flag forced to "decided".
    pub fn into_decided(self) -> Vision {
        Vision {
            decided: true,
            ..self
        }
    }
}

impl fmt::Display for Vision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.decided { '0' } else { '1' })?;
        for digit in self.cells {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

/// Advisory rectangle highlighted on the board after a look or search. Bounds are inclusive
/// and always inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHint {
    /// First highlighted row.
    pub top: usize,
    /// First highlighted column.
    pub left: usize,
    /// Last highlighted row.
    pub bottom: usize,
    /// Last highlighted column.
    pub right: usize,
    /// Side whose command produced the highlight.
    pub side: Side,
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// This side won.
    Winner(Side),
    /// Equal scores at the end of the budget.
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Winner(side) => write!(f, "{side} wins"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Snapshot of everything a board renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Terrain, row by row.
    pub map: Vec<Vec<Cell>>,
    /// Position of Cool.
    pub cool: Position,
    /// Position of Hot.
    pub hot: Position,
    /// `(cool, hot)` scores.
    pub scores: (u32, u32),
    /// Area to highlight, if the last command surveyed one.
    pub hint: Option<DisplayHint>,
}

/// Number of cells surveyed by a search.
const SEARCH_RANGE: i32 = 9;

/// The grid, both players, the scores and the turn budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    grid: Vec<Vec<Cell>>,
    cool: Position,
    hot: Position,
    cool_score: u32,
    hot_score: u32,
    turn_budget: u32,
    last_mover: Side,
    forced_winner: Option<Side>,
    hint: Option<DisplayHint>,
}

impl Default for GameState {
    /// 3×3 board with one item in the center, 100 turn pairs.
    fn default() -> Self {
        use Cell::*;
        GameState::new(
            vec![
                vec![Empty, Empty, Empty],
                vec![Wall, Item, Wall],
                vec![Empty, Empty, Empty],
            ],
            Position::new(0, 0),
            Position::new(2, 2),
            100,
        )
    }
}

impl GameState {
    /// Create a fresh state: zero scores, no forced winner, Hot counted as the last mover.
    pub fn new(grid: Vec<Vec<Cell>>, cool: Position, hot: Position, turn_budget: u32) -> Self {
        GameState {
            grid,
            cool,
            hot,
            cool_score: 0,
            hot_score: 0,
            turn_budget,
            last_mover: Side::Hot,
            forced_winner: None,
            hint: None,
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    /// Number of turn pairs of the match.
    pub fn turn_budget(&self) -> u32 {
        self.turn_budget
    }

    /// Terrain, row by row.
    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Current position of `side`.
    pub fn position_of(&self, side: Side) -> Position {
        match side {
            Side::Cool => self.cool,
            Side::Hot => self.hot,
        }
    }

    /// Number of items collected by `side`.
    pub fn score_of(&self, side: Side) -> u32 {
        match side {
            Side::Cool => self.cool_score,
            Side::Hot => self.hot_score,
        }
    }

    /// Side whose command was applied last.
    pub fn last_mover(&self) -> Side {
        self.last_mover
    }

    /// Highlight left by the last look or search.
    pub fn display_hint(&self) -> Option<DisplayHint> {
        self.hint
    }

    /// Terrain at `pos`; [`Cell::Wall`] outside the grid.
    pub fn cell_at(&self, pos: Position) -> Cell {
        let (Ok(row), Ok(col)) = (usize::try_from(pos.row), usize::try_from(pos.col)) else {
            return Cell::Wall;
        };
        self.grid
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or(Cell::Wall)
    }

    /// True if `side` stands on a wall or is walled in on all four sides.
    pub fn is_trapped(&self, side: Side) -> bool {
        let pos = self.position_of(side);
        if self.cell_at(pos) == Cell::Wall {
            return true;
        }
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
        .into_iter()
        .all(|dir| self.cell_at(pos.step(dir, 1)) == Cell::Wall)
    }

    /// Winner of the match, if already decided.
    ///
    /// A forced winner takes precedence. Otherwise the side that moved last is credited for
    /// trapping its opponent even if the same move also trapped itself.
    pub fn winner(&self) -> Option<Side> {
        if self.forced_winner.is_some() {
            return self.forced_winner;
        }
        let mover = self.last_mover;
        let other = mover.opponent();
        if self.is_trapped(other) {
            Some(mover)
        } else if self.is_trapped(mover) {
            Some(other)
        } else {
            None
        }
    }

    /// Result at normal match completion: the decided winner, else the higher score.
    pub fn outcome(&self) -> Outcome {
        if let Some(side) = self.winner() {
            return Outcome::Winner(side);
        }
        match self.cool_score.cmp(&self.hot_score) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::Cool),
            std::cmp::Ordering::Less => Outcome::Winner(Side::Hot),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// Override the result after an abnormal end of match.
    pub fn set_forced_winner(&mut self, side: Side) {
        self.forced_winner = Some(side);
    }

    /// 3×3 neighborhood of `center`, as seen by `side`.
    pub fn vision_around(&self, center: Position, side: Side) -> Vision {
        let rival = self.position_of(side.opponent());
        let mut cells = [0; 9];
        let mut idx = 0;
        for row in center.row - 1..=center.row + 1 {
            for col in center.col - 1..=center.col + 1 {
                cells[idx] = self.surveyed_digit(Position::new(row, col), rival);
                idx += 1;
            }
        }
        Vision {
            decided: self.winner().is_some(),
            cells,
        }
    }

    /// The 9 cells in a straight line from `side`'s position, excluding the position itself.
    pub fn vision_along_line(&self, side: Side, direction: Direction) -> Vision {
        let origin = self.position_of(side);
        let rival = self.position_of(side.opponent());
        let mut cells = [0; 9];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = self.surveyed_digit(origin.step(direction, i as i32 + 1), rival);
        }
        Vision {
            decided: self.winner().is_some(),
            cells,
        }
    }

    fn surveyed_digit(&self, pos: Position, rival: Position) -> u8 {
        if pos == rival {
            1
        } else {
            self.cell_at(pos).digit()
        }
    }

    /// Execute `command` for `side` and return the vision sent back to that side.
    pub fn apply_command(&mut self, command: Command, side: Side) -> Vision {
        self.last_mover = side;
        self.hint = None;
        let pos = self.position_of(side);
        let direction = command.direction;

        match command.action {
            Action::Walk => {
                let target = pos.step(direction, 1);
                if self.cell_at(target) == Cell::Item {
                    self.set_cell(target, Cell::Empty);
                    self.set_cell(pos, Cell::Wall);
                    match side {
                        Side::Cool => self.cool_score += 1,
                        Side::Hot => self.hot_score += 1,
                    }
                }
                match side {
                    Side::Cool => self.cool = target,
                    Side::Hot => self.hot = target,
                }
                self.vision_around(target, side)
            }
            Action::Put => {
                self.set_cell(pos.step(direction, 1), Cell::Wall);
                self.vision_around(pos, side)
            }
            Action::Look => {
                let probe = pos.step(direction, 2);
                if !command.suppress_hint {
                    self.hint = self.clipped_hint(
                        Position::new(probe.row - 1, probe.col - 1),
                        Position::new(probe.row + 1, probe.col + 1),
                        side,
                    );
                }
                self.vision_around(probe, side)
            }
            Action::Search => {
                let vision = self.vision_along_line(side, direction);
                if !command.suppress_hint {
                    self.hint = self.clipped_hint(
                        pos.step(direction, 1),
                        pos.step(direction, SEARCH_RANGE),
                        side,
                    );
                }
                vision
            }
        }
    }

    /// Renderer snapshot.
    pub fn field(&self) -> Field {
        Field {
            map: self.grid.clone(),
            cool: self.cool,
            hot: self.hot,
            scores: (self.cool_score, self.hot_score),
            hint: self.hint,
        }
    }

    /// Write `cell` at `pos`; out-of-bounds writes are ignored.
    fn set_cell(&mut self, pos: Position, cell: Cell) {
        let (Ok(row), Ok(col)) = (usize::try_from(pos.row), usize::try_from(pos.col)) else {
            return;
        };
        if let Some(slot) = self.grid.get_mut(row).and_then(|line| line.get_mut(col)) {
            *slot = cell;
        }
    }

    fn clipped_hint(&self, a: Position, b: Position, side: Side) -> Option<DisplayHint> {
        let (height, width) = (self.height() as i32, self.width() as i32);
        let top = a.row.min(b.row).max(0);
        let bottom = a.row.max(b.row).min(height - 1);
        let left = a.col.min(b.col).max(0);
        let right = a.col.max(b.col).min(width - 1);
        if top > bottom || left > right {
            return None;
        }
        Some(DisplayHint {
            top: top as usize,
            left: left as usize,
            bottom: bottom as usize,
            right: right as usize,
            side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Cell::*;

    fn cmd(action: Action, direction: Direction) -> Command {
        Command {
            action,
            direction,
            suppress_hint: false,
        }
    }

    fn open_board(height: usize, width: usize, cool: Position, hot: Position) -> GameState {
        GameState::new(vec![vec![Empty; width]; height], cool, hot, 10)
    }

    #[test]
    fn test_out_of_bounds_reads_as_wall() {
        let game = GameState::default();
        assert_eq!(game.cell_at(Position::new(-1, 0)), Wall);
        assert_eq!(game.cell_at(Position::new(0, 3)), Wall);
        assert_eq!(game.cell_at(Position::new(3, 0)), Wall);
        assert_eq!(game.cell_at(Position::new(1, 1)), Item);
        assert_eq!(game.cell_at(Position::new(0, 0)), Empty);
    }

    #[test]
    fn test_trapped_by_walls_and_boundary() {
        let game = GameState::new(
            vec![vec![Empty, Wall, Empty], vec![Wall, Empty, Empty]],
            Position::new(0, 0),
            Position::new(1, 2),
            1,
        );
        assert!(game.is_trapped(Side::Cool));
        assert!(!game.is_trapped(Side::Hot));
        assert_eq!(game.winner(), Some(Side::Hot));
    }

    #[test]
    fn test_standing_on_wall_is_trapped() {
        let game = GameState::new(
            vec![vec![Wall, Empty, Empty]],
            Position::new(0, 0),
            Position::new(0, 2),
            1,
        );
        assert!(game.is_trapped(Side::Cool));
    }

    #[test]
    fn test_mover_wins_double_trap() {
        // Hot | Cool | item : picking the item walls the cell between both players.
        let mut game = GameState::new(
            vec![vec![Empty, Empty, Item]],
            Position::new(0, 1),
            Position::new(0, 0),
            1,
        );
        assert_eq!(game.winner(), None);
        game.apply_command(cmd(Action::Walk, Direction::Right), Side::Cool);
        assert!(game.is_trapped(Side::Cool));
        assert!(game.is_trapped(Side::Hot));
        assert_eq!(game.winner(), Some(Side::Cool));

        let mut game = GameState::new(
            vec![vec![Empty, Empty, Item]],
            Position::new(0, 0),
            Position::new(0, 1),
            1,
        );
        game.apply_command(cmd(Action::Walk, Direction::Right), Side::Hot);
        assert!(game.is_trapped(Side::Cool));
        assert!(game.is_trapped(Side::Hot));
        assert_eq!(game.winner(), Some(Side::Hot));
    }

    #[test]
    fn test_forced_winner_short_circuits() {
        let mut game = GameState::new(
            vec![vec![Wall, Empty, Empty]],
            Position::new(0, 0),
            Position::new(0, 2),
            1,
        );
        assert_eq!(game.winner(), Some(Side::Hot));
        game.set_forced_winner(Side::Cool);
        assert_eq!(game.winner(), Some(Side::Cool));
        assert_eq!(game.outcome(), Outcome::Winner(Side::Cool));
    }

    #[test]
    fn test_item_pickup() {
        let mut game = GameState::default();
        game.apply_command(cmd(Action::Walk, Direction::Right), Side::Cool);
        assert_eq!(game.position_of(Side::Cool), Position::new(0, 1));
        assert_eq!(game.score_of(Side::Cool), 0);

        let vision = game.apply_command(cmd(Action::Walk, Direction::Down), Side::Cool);
        assert_eq!(game.position_of(Side::Cool), Position::new(1, 1));
        assert_eq!(game.score_of(Side::Cool), 1);
        assert_eq!(game.score_of(Side::Hot), 0);
        assert_eq!(game.cell_at(Position::new(1, 1)), Empty);
        assert_eq!(game.cell_at(Position::new(0, 1)), Wall);
        // row 0: vacated cell walled / row 1: self between walls / row 2: hot in the corner
        assert_eq!(vision.to_string(), "1020202001");
    }

    #[test]
    fn test_outcome_by_score() {
        let mut game = GameState::default();
        assert_eq!(game.outcome(), Outcome::Draw);
        game.apply_command(cmd(Action::Walk, Direction::Left), Side::Hot);
        game.apply_command(cmd(Action::Walk, Direction::Up), Side::Hot);
        assert_eq!(game.score_of(Side::Hot), 1);
        assert_eq!(game.winner(), None);
        assert_eq!(game.outcome(), Outcome::Winner(Side::Hot));
    }

    #[test]
    fn test_put_wall() {
        let mut game = open_board(3, 3, Position::new(1, 1), Position::new(2, 2));
        let vision = game.apply_command(cmd(Action::Put, Direction::Up), Side::Cool);
        assert_eq!(game.cell_at(Position::new(0, 1)), Wall);
        assert_eq!(game.position_of(Side::Cool), Position::new(1, 1));
        assert_eq!(vision.to_string(), "1020000001");

        // putting outside the grid is a no-op
        let mut game = open_board(1, 1, Position::new(0, 0), Position::new(5, 5));
        game.apply_command(cmd(Action::Put, Direction::Left), Side::Cool);
        assert_eq!(game.grid(), &[vec![Empty]]);
    }

    #[test]
    fn test_left_and_right_move_columns() {
        let mut game = open_board(3, 3, Position::new(1, 1), Position::new(0, 0));
        game.apply_command(cmd(Action::Walk, Direction::Left), Side::Cool);
        assert_eq!(game.position_of(Side::Cool), Position::new(1, 0));
        game.apply_command(cmd(Action::Walk, Direction::Right), Side::Cool);
        game.apply_command(cmd(Action::Walk, Direction::Right), Side::Cool);
        assert_eq!(game.position_of(Side::Cool), Position::new(1, 2));
    }

    #[test]
    fn test_look_two_cells_away() {
        let mut game = open_board(5, 5, Position::new(4, 2), Position::new(1, 1));
        let vision = game.apply_command(cmd(Action::Look, Direction::Up), Side::Cool);
        assert_eq!(game.position_of(Side::Cool), Position::new(4, 2));
        // centered on (2, 2); hot at (1, 1) is the top-left surveyed cell
        assert_eq!(vision.to_string(), "1100000000");
        let hint = game.display_hint().expect("look sets a hint");
        assert_eq!((hint.top, hint.left, hint.bottom, hint.right), (1, 1, 3, 3));
        assert_eq!(hint.side, Side::Cool);

        game.apply_command(cmd(Action::Put, Direction::Up), Side::Cool);
        assert_eq!(game.display_hint(), None);

        game.apply_command(
            Command {
                action: Action::Look,
                direction: Direction::Up,
                suppress_hint: true,
            },
            Side::Cool,
        );
        assert_eq!(game.display_hint(), None);
    }

    #[test]
    fn test_search_line() {
        let mut game = GameState::new(
            vec![vec![Empty, Item, Wall, Empty, Empty]],
            Position::new(0, 0),
            Position::new(0, 3),
            1,
        );
        let vision = game.apply_command(cmd(Action::Search, Direction::Right), Side::Cool);
        assert_eq!(vision.to_string(), "1321022222");
        let hint = game.display_hint().expect("search sets a hint");
        assert_eq!((hint.top, hint.left, hint.bottom, hint.right), (0, 1, 0, 4));

        let vision = game.apply_command(cmd(Action::Search, Direction::Up), Side::Hot);
        assert_eq!(vision.to_string(), "1222222222");
        assert_eq!(game.display_hint(), None);
    }

    #[test]
    fn test_decided_flag() {
        let mut game = GameState::new(
            vec![vec![Empty, Empty, Wall]],
            Position::new(0, 0),
            Position::new(0, 1),
            1,
        );
        let vision = game.apply_command(cmd(Action::Walk, Direction::Right), Side::Hot);
        assert!(vision.is_decided());
        assert!(vision.to_string().starts_with('0'));
        assert_eq!(game.winner(), Some(Side::Cool));
    }

    #[test]
    fn test_vision_length_and_digits() {
        let mut game = GameState::default();
        let moves = [
            (Side::Cool, Action::Walk, Direction::Right),
            (Side::Hot, Action::Search, Direction::Left),
            (Side::Cool, Action::Look, Direction::Down),
            (Side::Hot, Action::Put, Direction::Up),
            (Side::Cool, Action::Walk, Direction::Down),
            (Side::Hot, Action::Walk, Direction::Down),
        ];
        for (side, action, direction) in moves {
            let before = game.position_of(side);
            let vision = game.apply_command(cmd(action, direction), side);
            let text = vision.to_string();
            assert_eq!(text.len(), Vision::LEN);
            assert!(text.chars().all(|c| "0123".contains(c)));
            let after = game.position_of(side);
            assert!((after.row - before.row).abs() + (after.col - before.col).abs() <= 1);
            for line in game.grid() {
                assert!(line.iter().all(|c| [Empty, Wall, Item].contains(c)));
            }
        }
    }

    #[test]
    fn test_parse_vision() {
        let vision = Vision::parse("1222200231").unwrap();
        assert!(!vision.is_decided());
        assert_eq!(vision.cells(), &[2, 2, 2, 2, 0, 0, 2, 3, 1]);
        assert_eq!(vision.to_string(), "1222200231");
        assert!(Vision::parse("0000000000").unwrap().is_decided());

        for token in ["", "122220023", "12222002311", "2222200231", "1222200241", "1a22200231"] {
            assert_eq!(Vision::parse(token), None, "{token:?} should be rejected");
        }
    }

    #[test]
    fn test_command_token() {
        assert_eq!(Command::new(Action::Walk, Direction::Right).to_string(), "wr");
        let quiet = Command {
            suppress_hint: true,
            ..Command::new(Action::Search, Direction::Up)
        };
        assert_eq!(quiet.to_string(), "sun");
    }
}
