//! Colon-delimited text datagrams. Every message is a full snapshot, so
//! loss and reordering just mean a briefly stale view.

use mazerush_core::car::Car;

/// Reserved winner name announcing a host-side abort.
pub const MATCH_ABORTED: &str = "MATCH_ABORTED";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Host presence broadcast carrying the world seed.
    Announce { seed: u64 },
    /// Client knock on the host's state port.
    Hello,
    /// Full car snapshot.
    Update(Car),
    /// Seed push to a newly-registered client.
    Seed(u64),
    /// Race over; the payload is the winner name or [`MATCH_ABORTED`].
    Win(String),
    /// Item left the map.
    ItemCollected(u32),
    /// Coin returned to the map after a death.
    ItemDropped(u32),
    /// New match on a fresh seed.
    Reset(u64),
}

impl Message {
    pub fn encode(&self) -> String {
        match self {
            Message::Announce { seed } => format!("RACING_HOST_IS_HERE:{seed}"),
            Message::Hello => "HELLO:".to_string(),
            Message::Update(car) => format!(
                "UPDATE:{}:{}:{}:{}:{}:{}:{}:{}:{}",
                car.id,
                car.x,
                car.y,
                car.angle,
                car.color,
                car.name,
                car.coins,
                car.hp,
                u8::from(car.dead),
            ),
            Message::Seed(seed) => format!("SEED:{seed}"),
            Message::Win(winner) => format!("WIN:{winner}"),
            Message::ItemCollected(id) => format!("ITEM:{id}"),
            Message::ItemDropped(id) => format!("DROP:{id}"),
            Message::Reset(seed) => format!("RESET:{seed}"),
        }
    }

    /// Parse one datagram. `None` means malformed or unknown; callers
    /// discard those silently.
    pub fn parse(raw: &str) -> Option<Message> {
        let (kind, rest) = raw.trim_end().split_once(':')?;
        match kind {
            "RACING_HOST_IS_HERE" => Some(Message::Announce {
                seed: rest.parse().ok()?,
            }),
            "HELLO" => Some(Message::Hello),
            "UPDATE" => parse_update(raw),
            "SEED" => Some(Message::Seed(rest.parse().ok()?)),
            "WIN" if !rest.is_empty() => Some(Message::Win(rest.to_string())),
            "ITEM" => Some(Message::ItemCollected(rest.parse().ok()?)),
            "DROP" => Some(Message::ItemDropped(rest.parse().ok()?)),
            "RESET" => Some(Message::Reset(rest.parse().ok()?)),
            _ => None,
        }
    }
}

fn parse_update(raw: &str) -> Option<Message> {
    let parts: Vec<&str> = raw.trim_end().split(':').collect();
    if parts.len() < 10 || parts[1].is_empty() {
        return None;
    }
    let mut car = Car::new(
        parts[1],
        parts[2].parse::<f32>().ok()?,
        parts[3].parse::<f32>().ok()?,
        parts[5].parse::<i32>().ok()?,
        parts[6],
    );
    car.angle = parts[4].parse::<f32>().ok()?;
    car.coins = parts[7].parse::<u32>().ok()?;
    car.hp = parts[8].parse::<i32>().ok()?;
    car.dead = parts[9] == "1";
    Some(Message::Update(car))
}
