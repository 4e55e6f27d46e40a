use embedded_hal::digital::InputPin;

/// The three states the two-wire bus can be observed in. Purely combinational
/// on the current line levels — sampling it has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Both lines released high; either side may start a transaction.
    Idle,
    /// The host is holding clock low, inhibiting any device transmission.
    CommunicationInhibited,
    /// The host pulled data low while clock was high: a request to send a
    /// command byte.
    HostRequestToSend,
}

/// Sample the current bus state from the clock/data line levels.
pub fn sample<E, CLK, DATA>(clk: &mut CLK, data: &mut DATA) -> Result<BusState, E>
where
    CLK: InputPin<Error = E>,
    DATA: InputPin<Error = E>,
{
    if clk.is_low()? {
        Ok(BusState::CommunicationInhibited)
    } else if data.is_low()? {
        Ok(BusState::HostRequestToSend)
    } else {
        Ok(BusState::Idle)
    }
}
